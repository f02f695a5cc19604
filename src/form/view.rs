//! Snapshot of what the booking form shows. Adapters render a [`FormView`];
//! they never read controller internals.

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::warn;

use crate::slot_time;

pub const LOADING_LABEL: &str = "Loading...";
pub const NO_SLOTS_NOTICE: &str = "No available slots for this date and service.";
pub const SUBMIT_LABEL: &str = "Book Appointment";
pub const SUBMIT_BUSY_LABEL: &str = "Booking...";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub service: String,
    pub date: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotButton {
    /// Original ISO-8601 start, the identity sent back on click.
    pub iso: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotsRegion {
    Hidden,
    Loading,
    Empty,
    Slots(Vec<SlotButton>),
}

impl SlotsRegion {
    pub fn is_visible(&self) -> bool {
        !matches!(self, SlotsRegion::Hidden)
    }

    pub fn buttons(&self) -> &[SlotButton] {
        match self {
            SlotsRegion::Slots(buttons) => buttons,
            _ => &[],
        }
    }
}

/// The error and success regions are exclusive, so one optional value covers both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Error(String),
    Success(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitButton {
    pub enabled: bool,
    pub busy: bool,
}

impl SubmitButton {
    pub fn label(&self) -> &'static str {
        if self.busy {
            SUBMIT_BUSY_LABEL
        } else {
            SUBMIT_LABEL
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub fields: FormFields,
    pub min_date: NaiveDate,
    pub slots: SlotsRegion,
    pub submit: SubmitButton,
    pub message: Option<Message>,
}

impl FormView {
    pub fn error(&self) -> Option<&str> {
        match &self.message {
            Some(Message::Error(m)) => Some(m),
            _ => None,
        }
    }

    pub fn success(&self) -> Option<&str> {
        match &self.message {
            Some(Message::Success(m)) => Some(m),
            _ => None,
        }
    }
}

/// Build the slot region for a freshly fetched list. Nothing starts selected.
pub fn render_slots(slots: &[String], tz: Tz) -> SlotsRegion {
    if slots.is_empty() {
        return SlotsRegion::Empty;
    }

    let buttons = slots
        .iter()
        .map(|iso| {
            let label = slot_time::slot_label(iso, tz).unwrap_or_else(|| {
                warn!("Unparseable slot time '{}'", iso);
                iso.clone()
            });
            SlotButton {
                iso: iso.clone(),
                label,
                selected: false,
            }
        })
        .collect();
    SlotsRegion::Slots(buttons)
}
