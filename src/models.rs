use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub form: FormConfig,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FormConfig {
    /// IANA timezone used for slot labels and the minimum selectable date.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub services: Vec<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            services: Vec::new(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Body of `GET /available-slots`.
#[derive(Debug, Deserialize)]
pub struct AvailableSlots {
    pub available_slots: Vec<String>,
}

/// Body of `POST /bookings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub service_type: String,
    pub appointment_start: String,
}

/// Optional error body of a rejected booking. `detail` is only used when it is a string.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn detail_message(&self) -> Option<String> {
        self.detail
            .as_ref()
            .and_then(|d| d.as_str())
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
    }
}
