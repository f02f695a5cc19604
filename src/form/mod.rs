//! Booking form controller.
//!
//! [`BookingForm::dispatch`] applies a UI event and returns at most one
//! [`Effect`], a network call the caller must perform. The caller feeds the
//! result back through [`BookingForm::resolve`]. The controller is never
//! borrowed while a request is in flight, so other events can be handled in
//! the meantime and nothing is cancelled.

pub mod runner;
pub mod view;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use crate::client::{ApiError, SlotQuery};
use crate::models::BookingRequest;
use crate::slot_time;
pub use view::{FormFields, FormView, Message, SlotButton, SlotsRegion, SubmitButton};

pub const NO_SLOT_SELECTED: &str = "Please select a time slot";
pub const SLOTS_UNAVAILABLE: &str = "Unable to load available time slots. Please try again.";
pub const BOOKING_FAILED: &str = "Unable to complete booking. Please try again.";
pub const BOOKING_CONFIRMED: &str =
    "Booking confirmed! We will be in touch shortly to confirm your appointment details.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    ServiceChanged(String),
    DateChanged(String),
    NameChanged(String),
    EmailChanged(String),
    PhoneChanged(String),
    SlotClicked(String),
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchSlots { generation: u64, query: SlotQuery },
    CreateBooking(BookingRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    SlotsLoaded {
        generation: u64,
        result: Result<Vec<String>, ApiError>,
    },
    BookingCompleted(Result<(), ApiError>),
}

pub struct BookingForm {
    tz: Tz,
    min_date: NaiveDate,
    fields: FormFields,
    slots: SlotsRegion,
    selected: Option<String>,
    submitting: bool,
    message: Option<Message>,
    // Bumped whenever the slot list is reset; responses from older fetches are dropped.
    generation: u64,
}

impl BookingForm {
    pub fn new(tz: Tz) -> Self {
        Self::with_min_date(tz, slot_time::today(tz))
    }

    pub fn with_min_date(tz: Tz, min_date: NaiveDate) -> Self {
        Self {
            tz,
            min_date,
            fields: FormFields::default(),
            slots: SlotsRegion::Hidden,
            selected: None,
            submitting: false,
            message: None,
            generation: 0,
        }
    }

    pub fn view(&self) -> FormView {
        FormView {
            fields: self.fields.clone(),
            min_date: self.min_date,
            slots: self.slots.clone(),
            submit: SubmitButton {
                enabled: self.selected.is_some() && !self.submitting,
                busy: self.submitting,
            },
            message: self.message.clone(),
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn selected_slot(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn dispatch(&mut self, event: FormEvent) -> Option<Effect> {
        match event {
            FormEvent::ServiceChanged(service) => {
                self.fields.service = service;
                self.load_slots()
            }
            FormEvent::DateChanged(date) => {
                self.fields.date = date;
                self.load_slots()
            }
            FormEvent::NameChanged(v) => {
                self.fields.customer_name = v;
                None
            }
            FormEvent::EmailChanged(v) => {
                self.fields.customer_email = v;
                None
            }
            FormEvent::PhoneChanged(v) => {
                self.fields.customer_phone = v;
                None
            }
            FormEvent::SlotClicked(iso) => {
                self.select_slot(&iso);
                None
            }
            FormEvent::Submit => self.submit(),
        }
    }

    pub fn resolve(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::SlotsLoaded { generation, result } => {
                if generation != self.generation {
                    debug!(
                        "Discarding slot response #{} (latest is #{})",
                        generation, self.generation
                    );
                    return;
                }
                match result {
                    Ok(slots) => self.show_slots(&slots),
                    Err(e) => {
                        error!("Error fetching slots: {}", e);
                        self.show_error(SLOTS_UNAVAILABLE.to_string());
                        self.slots = SlotsRegion::Hidden;
                    }
                }
            }
            Outcome::BookingCompleted(result) => self.finish_booking(result),
        }
    }

    fn load_slots(&mut self) -> Option<Effect> {
        self.selected = None;
        // Any fetch still in flight no longer matches the form.
        self.generation += 1;
        if self.fields.service.is_empty() || self.fields.date.is_empty() {
            self.slots = SlotsRegion::Hidden;
            return None;
        }

        self.slots = SlotsRegion::Loading;
        self.hide_messages();
        Some(Effect::FetchSlots {
            generation: self.generation,
            query: SlotQuery {
                service: self.fields.service.clone(),
                date: self.fields.date.clone(),
            },
        })
    }

    fn show_slots(&mut self, slots: &[String]) {
        self.selected = None;
        self.slots = view::render_slots(slots, self.tz);
    }

    fn select_slot(&mut self, iso: &str) {
        let SlotsRegion::Slots(buttons) = &mut self.slots else {
            warn!("Ignoring click on slot {} while no slots are shown", iso);
            return;
        };
        if !buttons.iter().any(|b| b.iso == iso) {
            warn!("Ignoring click on unknown slot {}", iso);
            return;
        }
        for button in buttons.iter_mut() {
            button.selected = button.iso == iso;
        }
        self.selected = Some(iso.to_string());
    }

    fn submit(&mut self) -> Option<Effect> {
        if self.submitting {
            debug!("Booking already in progress, ignoring submit");
            return None;
        }
        let Some(slot) = self.selected.clone() else {
            self.show_error(NO_SLOT_SELECTED.to_string());
            return None;
        };

        self.submitting = true;
        self.hide_messages();

        Some(Effect::CreateBooking(BookingRequest {
            customer_name: self.fields.customer_name.clone(),
            customer_email: self.fields.customer_email.clone(),
            customer_phone: self.fields.customer_phone.clone(),
            service_type: self.fields.service.clone(),
            appointment_start: slot,
        }))
    }

    fn finish_booking(&mut self, result: Result<(), ApiError>) {
        self.submitting = false;
        match result {
            Ok(()) => {
                info!("Booking confirmed");
                self.show_success(BOOKING_CONFIRMED.to_string());
                self.fields = FormFields::default();
                self.slots = SlotsRegion::Hidden;
                self.selected = None;
                self.generation += 1;
            }
            Err(e) => {
                error!("Booking error: {}", e);
                self.show_error(booking_error_message(&e));
            }
        }
    }

    fn show_error(&mut self, message: String) {
        self.message = Some(Message::Error(message));
    }

    fn show_success(&mut self, message: String) {
        self.message = Some(Message::Success(message));
    }

    fn hide_messages(&mut self) {
        self.message = None;
    }
}

/// What the user sees when a booking is rejected or cannot be sent.
pub fn booking_error_message(e: &ApiError) -> String {
    match e {
        ApiError::Status {
            detail: Some(detail),
            ..
        } => detail.clone(),
        ApiError::Transport(msg) if !msg.trim().is_empty() => msg.clone(),
        _ => BOOKING_FAILED.to_string(),
    }
}
