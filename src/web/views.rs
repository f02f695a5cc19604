use leptos::prelude::*;

use crate::form::view::{LOADING_LABEL, NO_SLOTS_NOTICE};
use crate::form::{FormView, Message, SlotsRegion};

const STYLE: &str = include_str!("../style.css");

pub(super) fn render_page(form: &FormView, services: &[String], action: &str) -> String {
    let options_html = render_service_options(services, &form.fields.service);
    let slots_html = render_slots(&form.slots);
    let message_html = render_message(form.message.as_ref());

    let action = action.to_string();
    let date = form.fields.date.clone();
    let min_date = form.min_date.format("%Y-%m-%d").to_string();
    let name = form.fields.customer_name.clone();
    let email = form.fields.customer_email.clone();
    let phone = form.fields.customer_phone.clone();
    let container_class = if form.slots.is_visible() {
        "time-slots-container"
    } else {
        "time-slots-container hidden"
    };
    let submit_label = form.submit.label();
    let submit_disabled = !form.submit.enabled;

    view! {
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <title>"Book an Appointment"</title>
                <style>{STYLE}</style>
            </head>
            <body>
                <h1>"Book an Appointment"</h1>
                <form id="bookingForm" method="post" action=action>
                    <label for="serviceType">"Service"</label>
                    <select id="serviceType" name="service" inner_html=options_html />

                    <label for="appointmentDate">"Date"</label>
                    <input type="date" id="appointmentDate" name="date" min=min_date value=date />

                    <button type="submit" class="secondary" name="action" value="refresh">
                        "Show available times"
                    </button>

                    <div id="timeSlotsContainer" class=container_class>
                        <label>"Available times"</label>
                        <div id="timeSlots" class="time-slots" inner_html=slots_html />
                    </div>

                    <label for="customerName">"Name"</label>
                    <input type="text" id="customerName" name="customer_name" value=name />

                    <label for="customerEmail">"Email"</label>
                    <input type="email" id="customerEmail" name="customer_email" value=email />

                    <label for="customerPhone">"Phone"</label>
                    <input type="tel" id="customerPhone" name="customer_phone" value=phone />

                    <button type="submit" id="submitBtn" name="action" value="book" disabled=submit_disabled>
                        {submit_label}
                    </button>
                </form>
                <div inner_html=message_html />
            </body>
        </html>
    }
    .to_html()
}

/// Entry page. Mounting a form is a POST so crawlers and health checks create nothing.
pub(super) fn render_landing() -> String {
    view! {
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <title>"Book an Appointment"</title>
                <style>{STYLE}</style>
            </head>
            <body>
                <h1>"Book an Appointment"</h1>
                <form method="post" action="/forms">
                    <button type="submit">"Start booking"</button>
                </form>
            </body>
        </html>
    }
    .to_html()
}

fn render_service_options(services: &[String], current: &str) -> String {
    let mut html = view! { <option value="">"Select a service"</option> }.to_html();

    let mut names: Vec<String> = services.to_vec();
    if !current.is_empty() && !names.iter().any(|s| s == current) {
        names.push(current.to_string());
    }

    for name in names {
        let selected = name == current;
        let value = name.clone();
        html.push_str(&view! { <option value=value selected=selected>{name}</option> }.to_html());
    }
    html
}

fn render_slots(slots: &SlotsRegion) -> String {
    match slots {
        SlotsRegion::Hidden => String::new(),
        SlotsRegion::Loading => {
            view! { <div class="time-slot loading">{LOADING_LABEL}</div> }.to_html()
        }
        SlotsRegion::Empty => view! { <p class="empty">{NO_SLOTS_NOTICE}</p> }.to_html(),
        SlotsRegion::Slots(buttons) => buttons
            .iter()
            .map(|b| {
                let css = if b.selected {
                    "time-slot selected"
                } else {
                    "time-slot"
                };
                let value = format!("select:{}", b.iso);
                let label = b.label.clone();
                let title = b.iso.clone();

                view! {
                    <button type="submit" class=css name="action" value=value title=title>
                        {label}
                    </button>
                }
                .to_html()
            })
            .collect(),
    }
}

fn render_message(message: Option<&Message>) -> String {
    match message {
        Some(Message::Error(m)) => {
            let m = m.clone();
            view! { <div id="errorMessage" class="message error">{m}</div> }.to_html()
        }
        Some(Message::Success(m)) => {
            let m = m.clone();
            view! { <div id="successMessage" class="message success">{m}</div> }.to_html()
        }
        None => String::new(),
    }
}
