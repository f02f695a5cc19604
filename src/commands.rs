use anyhow::{bail, Result};
use tracing::info;

use crate::client::BookingApiClient;
use crate::config;
use crate::form::view::NO_SLOTS_NOTICE;
use crate::form::{runner, BookingForm, Effect, FormEvent, SlotButton, SlotsRegion};
use crate::models::Config;

pub struct BookArgs {
    pub service: String,
    pub date: String,
    pub time: Option<String>,
    pub slot: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub dry_run: bool,
}

/// Choose service and date on a fresh form and wait for the slot list.
async fn load_form(
    cfg: &Config,
    service: &str,
    date: &str,
) -> Result<(BookingForm, BookingApiClient)> {
    let tz = config::validate(cfg)?;
    if service.trim().is_empty() || date.trim().is_empty() {
        bail!("Both a service and a date are required");
    }

    let api = BookingApiClient::new(&cfg.api.url)?;
    let mut form = BookingForm::new(tz);
    runner::handle(&mut form, &api, FormEvent::ServiceChanged(service.to_string())).await;
    runner::handle(&mut form, &api, FormEvent::DateChanged(date.to_string())).await;

    if let Some(err) = form.view().error() {
        bail!("{err}");
    }
    Ok((form, api))
}

pub async fn run_slots(cfg: &Config, service: &str, date: &str) -> Result<()> {
    let (form, _) = load_form(cfg, service, date).await?;

    match form.view().slots {
        SlotsRegion::Slots(buttons) => {
            println!("Available slots for {} on {}:\n", service, date);
            for b in &buttons {
                println!("  {}  ({})", b.label, b.iso);
            }
        }
        _ => println!("{NO_SLOTS_NOTICE}"),
    }
    Ok(())
}

fn pick_slot<'a>(
    buttons: &'a [SlotButton],
    time: Option<&str>,
    iso: Option<&str>,
) -> Option<&'a SlotButton> {
    match (iso, time) {
        (Some(iso), _) => buttons.iter().find(|b| b.iso == iso),
        (None, Some(time)) => buttons.iter().find(|b| b.label == time.trim()),
        (None, None) => None,
    }
}

pub async fn run_book(cfg: &Config, args: BookArgs) -> Result<()> {
    if args.time.is_none() && args.slot.is_none() {
        bail!("Specify the slot with --time HH:MM or --slot <ISO datetime>");
    }

    let (mut form, api) = load_form(cfg, &args.service, &args.date).await?;

    let view = form.view();
    let Some(slot) = pick_slot(view.slots.buttons(), args.time.as_deref(), args.slot.as_deref())
    else {
        let wanted = args.slot.as_deref().or(args.time.as_deref()).unwrap_or("?");
        bail!(
            "No available slot at {} for '{}' on {}",
            wanted,
            args.service,
            args.date
        );
    };
    info!("Selected slot {} ({})", slot.label, slot.iso);

    form.dispatch(FormEvent::NameChanged(args.name));
    form.dispatch(FormEvent::EmailChanged(args.email));
    form.dispatch(FormEvent::PhoneChanged(args.phone));
    form.dispatch(FormEvent::SlotClicked(slot.iso.clone()));

    if args.dry_run {
        match form.dispatch(FormEvent::Submit) {
            Some(Effect::CreateBooking(request)) => {
                println!(
                    "[DRY RUN] Would send booking:\n{}",
                    serde_json::to_string_pretty(&request)?
                );
                return Ok(());
            }
            _ => bail!("{}", form.view().error().unwrap_or("Nothing to submit")),
        }
    }

    runner::handle(&mut form, &api, FormEvent::Submit).await;

    let view = form.view();
    if let Some(err) = view.error() {
        bail!("{err}");
    }
    if let Some(msg) = view.success() {
        println!("{msg}");
    }
    Ok(())
}
