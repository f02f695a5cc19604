use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use tracing::debug;

use crate::models::{AvailableSlots, BookingRequest, ErrorBody};

const CLIENT_UA: &str = concat!("booking-form/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(String),

    #[error("server returned status {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("invalid response: {0}")]
    Decode(String),
}

/// Parameters of one availability lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotQuery {
    pub service: String,
    pub date: String,
}

/// The two endpoints of the external booking API.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// ISO-8601 start times that can be booked for the query.
    async fn available_slots(&self, query: &SlotQuery) -> Result<Vec<String>, ApiError>;

    /// Create a booking. The success body is ignored.
    async fn create_booking(&self, request: &BookingRequest) -> Result<(), ApiError>;
}

pub fn slots_url(base_url: &str, query: &SlotQuery) -> String {
    format!(
        "{}/available-slots?date={}&service={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(&query.date),
        urlencoding::encode(&query.service)
    )
}

pub fn bookings_url(base_url: &str) -> String {
    format!("{}/bookings", base_url.trim_end_matches('/'))
}

pub struct BookingApiClient {
    client: Client,
    base_url: String,
}

impl BookingApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .default_headers(default_headers())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_UA));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

#[async_trait]
impl BookingApi for BookingApiClient {
    async fn available_slots(&self, query: &SlotQuery) -> Result<Vec<String>, ApiError> {
        let url = slots_url(&self.base_url, query);

        let resp = self.client.get(&url).send().await.map_err(transport)?;

        let status = resp.status();
        let text = resp.text().await.map_err(transport)?;
        debug!("Slots response (status {}): {}", status, text);

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: None,
            });
        }

        let body: AvailableSlots =
            serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?;

        debug!("Fetched {} slots", body.available_slots.len());
        Ok(body.available_slots)
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<(), ApiError> {
        let url = bookings_url(&self.base_url);

        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        let text = resp.text().await.map_err(transport)?;
        debug!("Booking response (status {}): {}", status, text);

        if status.is_success() {
            return Ok(());
        }

        let detail = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.detail_message());
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}
