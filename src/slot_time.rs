use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Today's date in the given timezone. Used as the earliest selectable date.
pub fn today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Format an ISO-8601 slot start as a 24-hour `HH:MM` label.
///
/// Timestamps with an offset are shown in `tz`; naive timestamps are already
/// wall-clock times and are formatted as-is. Returns `None` when the string is
/// not a recognisable datetime.
pub fn slot_label(iso: &str, tz: Tz) -> Option<String> {
    let iso = iso.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Some(dt.with_timezone(&tz).format("%H:%M").to_string());
    }
    iso.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(iso, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|dt| dt.format("%H:%M").to_string())
}
