mod client;
mod commands;
mod config;
mod form;
mod models;
mod slot_time;
mod web;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::BookArgs;

/// Appointment booking form — pick a service, a date and a time slot, then book it.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file
    #[arg(short = 'c', long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Override the booking API base URL (also read from API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print detailed API responses
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the booking form over HTTP
    Serve {
        /// Listen address (e.g. "0.0.0.0:3000")
        #[arg(short = 'a', long, default_value = "0.0.0.0:3009")]
        addr: String,
    },

    /// List available time slots for a service on a date
    Slots {
        /// Service type, as offered by the booking API
        #[arg(short = 's', long)]
        service: String,

        /// Date (YYYY-MM-DD)
        #[arg(short = 'D', long)]
        date: String,
    },

    /// Book one time slot
    ///
    /// Examples:
    ///   book -s Consultation -D 2030-06-01 -t 09:30 --name "Ada" --email ada@example.com --phone 555-0100
    ///   book -s Consultation -D 2030-06-01 --slot 2030-06-01T09:30:00Z ... -d
    Book {
        #[arg(short = 's', long)]
        service: String,

        /// Date (YYYY-MM-DD)
        #[arg(short = 'D', long)]
        date: String,

        /// Slot start as shown by `slots` (HH:MM)
        #[arg(short = 't', long, conflicts_with = "slot")]
        time: Option<String>,

        /// Slot start as an ISO-8601 datetime
        #[arg(long)]
        slot: Option<String>,

        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: String,

        /// Dry run — pick the slot but print the request instead of sending it
        #[arg(short = 'd', long)]
        debug: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut cfg = config::load_config(&cli.config)?;
    config::apply_api_url(&mut cfg, cli.api_url.as_deref());

    match cli.command {
        Command::Serve { addr } => {
            web::serve(cfg, &addr).await?;
        }
        Command::Slots { service, date } => {
            commands::run_slots(&cfg, &service, &date).await?;
        }
        Command::Book {
            service,
            date,
            time,
            slot,
            name,
            email,
            phone,
            debug,
        } => {
            let args = BookArgs {
                service,
                date,
                time,
                slot,
                name,
                email,
                phone,
                dry_run: debug,
            };
            commands::run_book(&cfg, args).await?;
        }
    }

    Ok(())
}
