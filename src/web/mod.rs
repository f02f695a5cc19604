pub mod handlers;
pub mod registry;
pub mod views;

use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use chrono_tz::Tz;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::client::{BookingApi, BookingApiClient};
use crate::config;
use crate::form::BookingForm;
use crate::models::Config;
use registry::{FormRegistry, FORM_IDLE_TTL, MAX_FORMS};

pub(crate) type SharedForm = Arc<Mutex<BookingForm>>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) services: Arc<Vec<String>>,
    pub(crate) tz: Tz,
    pub(crate) api: Arc<dyn BookingApi>,
    /// One controller per mounted form.
    pub(crate) forms: Arc<FormRegistry>,
}

impl AppState {
    pub(crate) fn new(services: Vec<String>, tz: Tz, api: Arc<dyn BookingApi>) -> Self {
        Self {
            services: Arc::new(services),
            tz,
            api,
            forms: Arc::new(FormRegistry::new(FORM_IDLE_TTL, MAX_FORMS)),
        }
    }
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::landing))
        .route("/forms", post(handlers::new_form))
        .route(
            "/forms/{id}",
            get(handlers::show_form).post(handlers::post_form),
        )
        .with_state(state)
}

pub async fn serve(cfg: Config, addr: &str) -> Result<()> {
    let tz = config::validate(&cfg)?;
    let api: Arc<dyn BookingApi> = Arc::new(BookingApiClient::new(&cfg.api.url)?);
    let state = AppState::new(cfg.form.services.clone(), tz, api);

    let app = router(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr).await?;
    info!("Booking form listening on http://{} (API: {})", addr, cfg.api.url);
    axum::serve(listener, app).await?;
    Ok(())
}
