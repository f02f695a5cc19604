use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info};

use super::{BookingForm, Effect, FormEvent, Outcome};
use crate::client::BookingApi;

/// Perform one effect against the API. Never cancelled once started.
pub async fn perform(api: &dyn BookingApi, effect: Effect) -> Outcome {
    match effect {
        Effect::FetchSlots { generation, query } => {
            info!(
                "Fetching slots for '{}' on {} (#{})",
                query.service, query.date, generation
            );
            let result = api.available_slots(&query).await;
            Outcome::SlotsLoaded { generation, result }
        }
        Effect::CreateBooking(request) => {
            info!(
                "Booking '{}' at {} for {}",
                request.service_type, request.appointment_start, request.customer_name
            );
            Outcome::BookingCompleted(api.create_booking(&request).await)
        }
    }
}

/// Handle an event on a form the caller owns exclusively.
pub async fn handle(form: &mut BookingForm, api: &dyn BookingApi, event: FormEvent) {
    if let Some(effect) = form.dispatch(event) {
        let outcome = perform(api, effect).await;
        form.resolve(outcome);
    }
}

/// Handle an event on a shared form. The lock is released while the request
/// is in flight so overlapping events on the same form still go through.
///
/// The request and its completion run on a spawned task: dropping the caller
/// (a disconnected HTTP client, say) does not stop the form from being resolved.
pub async fn handle_shared(
    form: &Arc<Mutex<BookingForm>>,
    api: &Arc<dyn BookingApi>,
    event: FormEvent,
) {
    let effect = {
        let mut guard = form.lock().unwrap_or_else(PoisonError::into_inner);
        guard.dispatch(event)
    };
    let Some(effect) = effect else {
        return;
    };

    let form = Arc::clone(form);
    let api = Arc::clone(api);
    let task = tokio::spawn(async move {
        let outcome = perform(api.as_ref(), effect).await;
        form.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(outcome);
    });
    if let Err(e) = task.await {
        error!("Form request task failed: {}", e);
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::client::{ApiError, BookingApi, SlotQuery};
    use crate::models::BookingRequest;

    /// In-memory API that records every call and replays canned responses.
    #[derive(Default)]
    pub(crate) struct MockApi {
        pub(crate) slot_queries: Mutex<Vec<SlotQuery>>,
        pub(crate) bookings: Mutex<Vec<BookingRequest>>,
        slot_responses: Mutex<VecDeque<Result<Vec<String>, ApiError>>>,
        booking_responses: Mutex<VecDeque<Result<(), ApiError>>>,
        delay: Option<Duration>,
    }

    impl MockApi {
        pub(crate) fn with_slots(self, result: Result<Vec<String>, ApiError>) -> Self {
            self.slot_responses.lock().unwrap().push_back(result);
            self
        }

        pub(crate) fn with_booking(self, result: Result<(), ApiError>) -> Self {
            self.booking_responses.lock().unwrap().push_back(result);
            self
        }

        /// Every call sleeps this long before answering.
        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        async fn wait(&self) {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
        }

        pub(crate) fn slot_queries(&self) -> Vec<SlotQuery> {
            self.slot_queries.lock().unwrap().clone()
        }

        pub(crate) fn bookings(&self) -> Vec<BookingRequest> {
            self.bookings.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BookingApi for MockApi {
        async fn available_slots(&self, query: &SlotQuery) -> Result<Vec<String>, ApiError> {
            self.slot_queries.lock().unwrap().push(query.clone());
            self.wait().await;
            self.slot_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![]))
        }

        async fn create_booking(&self, request: &BookingRequest) -> Result<(), ApiError> {
            self.bookings.lock().unwrap().push(request.clone());
            self.wait().await;
            self.booking_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(()))
        }
    }
}
