use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use tracing::warn;

use crate::models::Config;

/// Environment variable that overrides `[api] url`.
pub const API_URL_ENV: &str = "API_URL";

/// Load the TOML config. A missing file yields defaults so the API URL can
/// come from the environment alone.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str::<Config>(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        warn!("{} not found, using defaults", path.display());
        Config::default()
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
        apply_api_url(&mut config, Some(&url));
    }
    Ok(config)
}

/// Replace the configured API base URL when an override is given.
pub fn apply_api_url(config: &mut Config, url: Option<&str>) {
    if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
        config.api.url = url.trim_end_matches('/').to_string();
    }
}

pub fn validate(config: &Config) -> Result<Tz> {
    if config.api.url.trim().is_empty() {
        bail!("No API URL configured: set [api] url, {API_URL_ENV} or --api-url");
    }
    timezone(config)
}

pub fn timezone(config: &Config) -> Result<Tz> {
    config
        .form
        .timezone
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", config.form.timezone, e))
}
