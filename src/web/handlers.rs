use std::sync::PoisonError;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use axum::Form;
use serde::Deserialize;
use tracing::{debug, info};

use super::views::{render_landing, render_page};
use super::{AppState, SharedForm};
use crate::form::runner::handle_shared;
use crate::form::FormEvent;

/// Everything the HTML form posts. `action` is `refresh`, `book` or `select:<iso>`.
#[derive(Debug, Deserialize)]
pub(crate) struct FormPost {
    #[serde(default)]
    service: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    customer_name: String,
    #[serde(default)]
    customer_email: String,
    #[serde(default)]
    customer_phone: String,
    #[serde(default)]
    action: String,
}

fn form_url(id: u64) -> String {
    format!("/forms/{id}")
}

fn lookup(state: &AppState, id: u64) -> Result<SharedForm, StatusCode> {
    state.forms.get(id).ok_or(StatusCode::NOT_FOUND)
}

pub(crate) async fn landing() -> Html<String> {
    Html(render_landing())
}

pub(crate) async fn new_form(State(state): State<AppState>) -> Redirect {
    let id = state.forms.mount(state.tz);
    info!("Mounted booking form #{} ({} active)", id, state.forms.len());
    Redirect::to(&form_url(id))
}

pub(crate) async fn show_form(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Html<String>, StatusCode> {
    let form = lookup(&state, id)?;
    let view = form.lock().unwrap_or_else(PoisonError::into_inner).view();
    Ok(Html(render_page(&view, &state.services, &form_url(id))))
}

pub(crate) async fn post_form(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(post): Form<FormPost>,
) -> Result<Redirect, StatusCode> {
    let form = lookup(&state, id)?;
    let api = &state.api;

    let (service_changed, date_changed) = {
        let f = form.lock().unwrap_or_else(PoisonError::into_inner);
        (
            f.fields().service != post.service,
            f.fields().date != post.date,
        )
    };

    for event in [
        FormEvent::NameChanged(post.customer_name),
        FormEvent::EmailChanged(post.customer_email),
        FormEvent::PhoneChanged(post.customer_phone),
    ] {
        handle_shared(&form, api, event).await;
    }
    if service_changed {
        handle_shared(&form, api, FormEvent::ServiceChanged(post.service)).await;
    }
    if date_changed {
        handle_shared(&form, api, FormEvent::DateChanged(post.date)).await;
    }

    match post.action.as_str() {
        "book" => handle_shared(&form, api, FormEvent::Submit).await,
        "refresh" => {
            // Unchanged fields still re-query, so a failed lookup can be retried.
            if !service_changed && !date_changed {
                let date = form
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .fields()
                    .date
                    .clone();
                handle_shared(&form, api, FormEvent::DateChanged(date)).await;
            }
        }
        action => {
            if let Some(iso) = action.strip_prefix("select:") {
                handle_shared(&form, api, FormEvent::SlotClicked(iso.to_string())).await;
            } else {
                debug!("Form #{}: unknown action '{}'", id, action);
            }
        }
    }

    Ok(Redirect::to(&form_url(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiError;
    use crate::form::runner::mock::MockApi;
    use crate::web::{router, AppState};
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono_tz::UTC;
    use std::sync::Arc;
    use tower::ServiceExt;

    const SLOT: &str = "2030-06-01T14:00:00Z";

    fn app(api: Arc<MockApi>) -> (axum::Router, AppState) {
        let state = AppState::new(vec!["Consultation".into(), "Check-up".into()], UTC, api);
        (router(state.clone()), state)
    }

    fn post(id: u64, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/forms/{id}"))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn mount(app: &axum::Router) -> u64 {
        let resp = app
            .clone()
            .oneshot(Request::post("/forms").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers()[header::LOCATION].to_str().unwrap();
        location.trim_start_matches("/forms/").parse().unwrap()
    }

    fn form_of(state: &AppState, id: u64) -> SharedForm {
        state.forms.get(id).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_form_is_404() {
        let (app, _) = app(Arc::new(MockApi::default()));
        let resp = app
            .oneshot(Request::get("/forms/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_landing_page_mounts_nothing() {
        let (app, state) = app(Arc::new(MockApi::default()));
        for _ in 0..3 {
            let resp = app
                .clone()
                .oneshot(Request::get("/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }
        assert_eq!(state.forms.len(), 0);

        mount(&app).await;
        assert_eq!(state.forms.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_retries_failed_lookup() {
        let api = Arc::new(
            MockApi::default()
                .with_slots(Err(ApiError::Status {
                    status: 500,
                    detail: None,
                }))
                .with_slots(Ok(vec![SLOT.into()])),
        );
        let (app, state) = app(Arc::clone(&api));
        let id = mount(&app).await;
        let body = "service=Consultation&date=2030-06-01&action=refresh";

        app.clone().oneshot(post(id, body)).await.unwrap();
        {
            let view = form_of(&state, id).lock().unwrap().view();
            assert!(view.error().is_some());
            assert_eq!(view.slots, crate::form::SlotsRegion::Hidden);
        }

        app.clone().oneshot(post(id, body)).await.unwrap();
        assert_eq!(api.slot_queries().len(), 2);
        let view = form_of(&state, id).lock().unwrap().view();
        assert_eq!(view.error(), None);
        assert_eq!(view.slots.buttons().len(), 1);
    }

    #[tokio::test]
    async fn test_forms_are_independent() {
        let (app, state) = app(Arc::new(MockApi::default()));
        let a = mount(&app).await;
        let b = mount(&app).await;
        assert_ne!(a, b);

        app.clone()
            .oneshot(post(a, "service=Consultation&date=&customer_name=Ann&action=refresh"))
            .await
            .unwrap();
        assert_eq!(form_of(&state, a).lock().unwrap().fields().customer_name, "Ann");
        assert!(form_of(&state, b).lock().unwrap().fields().customer_name.is_empty());
    }

    #[tokio::test]
    async fn test_post_flow_books_selected_slot() {
        let api = Arc::new(
            MockApi::default()
                .with_slots(Ok(vec![SLOT.into()]))
                .with_booking(Ok(())),
        );
        let (app, state) = app(Arc::clone(&api));
        let id = mount(&app).await;

        let fields = "service=Check-up&date=2030-06-01&customer_name=Lin&customer_email=lin%40example.com&customer_phone=555";
        let resp = app
            .clone()
            .oneshot(post(id, &format!("{fields}&action=refresh")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        // Only the date change has both fields set, so one query
        assert_eq!(api.slot_queries().len(), 1);

        let select = format!("{fields}&action=select%3A{}", urlencoding::encode(SLOT));
        app.clone().oneshot(post(id, &select)).await.unwrap();
        assert_eq!(form_of(&state, id).lock().unwrap().selected_slot(), Some(SLOT));

        app.clone()
            .oneshot(post(id, &format!("{fields}&action=book")))
            .await
            .unwrap();

        let sent = api.bookings();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].appointment_start, SLOT);
        assert_eq!(sent[0].customer_email, "lin@example.com");
        assert_eq!(sent[0].service_type, "Check-up");

        let view = form_of(&state, id).lock().unwrap().view();
        assert!(view.success().is_some());
        assert!(view.fields.service.is_empty());
    }

    #[tokio::test]
    async fn test_rejection_is_rendered() {
        let api = Arc::new(
            MockApi::default()
                .with_slots(Ok(vec![SLOT.into()]))
                .with_booking(Err(ApiError::Status {
                    status: 409,
                    detail: Some("Slot already taken".into()),
                })),
        );
        let (app, _) = app(api);
        let id = mount(&app).await;

        let fields = "service=Consultation&date=2030-06-01&customer_name=Lin";
        app.clone()
            .oneshot(post(id, &format!("{fields}&action=refresh")))
            .await
            .unwrap();
        let select = format!("{fields}&action=select%3A{}", urlencoding::encode(SLOT));
        app.clone().oneshot(post(id, &select)).await.unwrap();
        app.clone()
            .oneshot(post(id, &format!("{fields}&action=book")))
            .await
            .unwrap();

        let resp = app
            .oneshot(Request::get(format!("/forms/{id}")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Slot already taken"));
        assert!(html.contains("value=\"Lin\""));
    }
}
