use actix_web::{http::header, web, HttpRequest, HttpResponse, Result};
use actix_web::cookie::{Cookie, SameSite};
use askama::Template;
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;

use crate::{
    auth::{auth_cookie, auth_token, clear_auth_cookie, new_id},
    models::{Appointment, AppointmentStatus, ServiceStatus},
    schedule::{derive_slots, upcoming_dates},
    state::AppState,
    templates::render,
    wizard::{BookingWizard, ClientDetails, WizardStep},
};

const WIZARD_COOKIE: &str = "booking_session";

#[derive(Clone, Debug)]
struct ServiceView {
    id: String,
    name: String,
    description: String,
    price_display: String,
    duration: u32,
}

#[derive(Clone, Debug)]
struct DateView {
    value: String,
    display: String,
    selected: bool,
}

#[derive(Clone, Debug)]
struct SlotView {
    id: String,
    time: String,
    available: bool,
    selected: bool,
}

#[derive(Clone, Debug, Default)]
struct DetailsView {
    name: String,
    phone: String,
    email: String,
    notes: String,
}

/// Everything already chosen, pre-formatted for the step headers and the
/// confirmation card. Empty strings where nothing is chosen yet.
#[derive(Clone, Debug, Default)]
struct SummaryView {
    service_name: String,
    price_display: String,
    duration_display: String,
    date_display: String,
    time_display: String,
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    services: Vec<ServiceView>,
    year: i32,
}

#[derive(Template)]
#[template(path = "booking.html")]
struct BookingTemplate {
    step: u8,
    services: Vec<ServiceView>,
    dates: Vec<DateView>,
    slots: Vec<SlotView>,
    summary: SummaryView,
    form: DetailsView,
    errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    errors: Vec<String>,
    next: String,
    username: String,
}

#[derive(Deserialize)]
struct ServiceChoiceForm {
    service_id: String,
}

#[derive(Deserialize)]
struct DateChoiceForm {
    date: String,
}

#[derive(Deserialize)]
struct SlotChoiceForm {
    slot_id: String,
}

#[derive(Deserialize)]
struct DetailsForm {
    name: String,
    phone: String,
    email: String,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct LoginQuery {
    next: Option<String>,
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
    next: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home)))
        .service(web::resource("/booking").route(web::get().to(show_wizard)))
        .service(web::resource("/booking/service").route(web::post().to(choose_service)))
        .service(web::resource("/booking/date").route(web::post().to(choose_date)))
        .service(web::resource("/booking/time").route(web::post().to(choose_time)))
        .service(web::resource("/booking/details").route(web::post().to(submit_details)))
        .service(web::resource("/booking/back").route(web::post().to(step_back)))
        .service(web::resource("/booking/restart").route(web::post().to(restart)))
        .service(
            web::resource("/login")
                .route(web::get().to(show_login))
                .route(web::post().to(login)),
        )
        .service(web::resource("/logout").route(web::get().to(logout)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn home(state: web::Data<AppState>) -> Result<HttpResponse> {
    let store = state.store.lock().await;
    let services = store
        .services()
        .iter()
        .filter(|service| service.status == ServiceStatus::Active)
        .map(|service| ServiceView {
            id: service.id.clone(),
            name: service.name.clone(),
            description: service.description.clone(),
            price_display: format!("${:.2}", service.price),
            duration: service.duration,
        })
        .collect();

    Ok(render(HomeTemplate {
        services,
        year: Local::now().year(),
    }))
}

/// Reads the visitor's wizard key, minting a cookie for first-timers.
fn wizard_key(req: &HttpRequest) -> (String, Option<Cookie<'static>>) {
    match req.cookie(WIZARD_COOKIE) {
        Some(cookie) => (cookie.value().to_string(), None),
        None => {
            let key = new_id();
            let cookie = Cookie::build(WIZARD_COOKIE, key.clone())
                .path("/booking")
                .http_only(true)
                .same_site(SameSite::Lax)
                .finish();
            (key, Some(cookie))
        }
    }
}

async fn wizard_for(state: &AppState, key: &str) -> BookingWizard {
    state
        .wizards
        .lock()
        .await
        .entry(key.to_string())
        .or_insert_with(BookingWizard::new)
        .clone()
}

async fn store_wizard(state: &AppState, key: &str, wizard: BookingWizard) {
    state.wizards.lock().await.insert(key.to_string(), wizard);
}

fn back_to_wizard() -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/booking"))
        .finish()
}

async fn booking_page(
    state: &AppState,
    wizard: &BookingWizard,
    form: DetailsView,
    errors: Vec<String>,
) -> HttpResponse {
    let store = state.store.lock().await;
    let draft = wizard.draft();

    let services = store
        .services()
        .iter()
        .map(|service| ServiceView {
            id: service.id.clone(),
            name: service.name.clone(),
            description: service.description.clone(),
            price_display: format!("${:.2}", service.price),
            duration: service.duration,
        })
        .collect();

    let today = Local::now().date_naive();
    let dates = upcoming_dates(today, 7)
        .into_iter()
        .map(|option| {
            let selected = draft
                .date
                .map_or(false, |date| date.format("%Y-%m-%d").to_string() == option.value);
            DateView {
                value: option.value,
                display: option.display,
                selected,
            }
        })
        .collect();

    let slots = match (&draft.service, draft.date) {
        (Some(service), Some(date)) => {
            derive_slots(store.appointments(), date, service.duration)
                .into_iter()
                .map(|slot| SlotView {
                    selected: draft.slot.as_ref().map_or(false, |chosen| chosen.id == slot.id),
                    id: slot.id,
                    time: slot.time,
                    available: slot.available,
                })
                .collect()
        }
        _ => Vec::new(),
    };

    let mut summary = SummaryView::default();
    if let Some(service) = &draft.service {
        summary.service_name = service.name.clone();
        summary.price_display = format!("${:.2}", service.price);
        summary.duration_display = format!("{} minutes", service.duration);
    }
    if let Some(date) = draft.date {
        summary.date_display = date.format("%A, %B %-d").to_string();
    }
    if let Some(slot) = &draft.slot {
        summary.time_display = slot.time.clone();
    }

    render(BookingTemplate {
        step: wizard.step().number(),
        services,
        dates,
        slots,
        summary,
        form,
        errors,
    })
}

async fn show_wizard(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let (key, new_cookie) = wizard_key(&req);
    let wizard = wizard_for(&state, &key).await;
    let form = wizard
        .draft()
        .details
        .as_ref()
        .map(|details| DetailsView {
            name: details.name.clone(),
            phone: details.phone.clone(),
            email: details.email.clone(),
            notes: details.notes.clone(),
        })
        .unwrap_or_default();

    let mut response = booking_page(&state, &wizard, form, Vec::new()).await;
    if let Some(cookie) = new_cookie {
        let _ = response.add_cookie(&cookie);
    }
    Ok(response)
}

async fn choose_service(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<ServiceChoiceForm>,
) -> Result<HttpResponse> {
    let (key, _) = wizard_key(&req);
    let mut wizard = wizard_for(&state, &key).await;

    let service = {
        let store = state.store.lock().await;
        store.service(&form.service_id).cloned()
    };
    if let Some(service) = service {
        if !wizard.select_service(service) {
            log::debug!("service selection ignored at step {}", wizard.step().number());
        }
    }

    store_wizard(&state, &key, wizard).await;
    Ok(back_to_wizard())
}

async fn choose_date(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<DateChoiceForm>,
) -> Result<HttpResponse> {
    let (key, _) = wizard_key(&req);
    let mut wizard = wizard_for(&state, &key).await;

    if let Ok(date) = NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d") {
        wizard.select_date(date);
    }

    store_wizard(&state, &key, wizard).await;
    Ok(back_to_wizard())
}

async fn choose_time(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<SlotChoiceForm>,
) -> Result<HttpResponse> {
    let (key, _) = wizard_key(&req);
    let mut wizard = wizard_for(&state, &key).await;

    let slot = {
        let store = state.store.lock().await;
        match (&wizard.draft().service, wizard.draft().date) {
            (Some(service), Some(date)) => {
                derive_slots(store.appointments(), date, service.duration)
                    .into_iter()
                    .find(|slot| slot.id == form.slot_id)
            }
            _ => None,
        }
    };
    if let Some(slot) = slot {
        // An unavailable slot is rejected inside the wizard as well.
        wizard.select_time(slot);
    }

    store_wizard(&state, &key, wizard).await;
    Ok(back_to_wizard())
}

async fn submit_details(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<DetailsForm>,
) -> Result<HttpResponse> {
    let (key, _) = wizard_key(&req);
    let mut wizard = wizard_for(&state, &key).await;
    let form = form.into_inner();

    let mut errors = Vec::new();
    if form.name.trim().is_empty() {
        errors.push("Full name is required.".to_string());
    }
    if form.phone.trim().is_empty() {
        errors.push("Phone number is required.".to_string());
    }
    if form.email.trim().is_empty() {
        errors.push("Email address is required.".to_string());
    }

    if !errors.is_empty() {
        let view = DetailsView {
            name: form.name,
            phone: form.phone,
            email: form.email,
            notes: form.notes.unwrap_or_default(),
        };
        return Ok(booking_page(&state, &wizard, view, errors).await);
    }

    let details = ClientDetails {
        name: form.name.trim().to_string(),
        phone: form.phone.trim().to_string(),
        email: form.email.trim().to_string(),
        notes: form.notes.unwrap_or_default().trim().to_string(),
    };

    if wizard.submit_details(details) {
        if let Some(appointment) = completed_booking(&wizard) {
            state.store.lock().await.add_appointment(appointment);
        }
    }

    store_wizard(&state, &key, wizard).await;
    Ok(back_to_wizard())
}

/// A confirmed traversal becomes a pending appointment in the store.
fn completed_booking(wizard: &BookingWizard) -> Option<Appointment> {
    if wizard.step() != WizardStep::Confirmed {
        return None;
    }
    let draft = wizard.draft();
    let service = draft.service.as_ref()?;
    let date = draft.date?;
    let slot = draft.slot.as_ref()?;
    let details = draft.details.as_ref()?;

    Some(Appointment {
        id: new_id(),
        client_name: details.name.clone(),
        service_id: Some(service.id.clone()),
        service_name: service.name.clone(),
        date,
        time: slot.time.clone(),
        duration: service.duration,
        status: AppointmentStatus::Pending,
        notes: if details.notes.is_empty() {
            None
        } else {
            Some(details.notes.clone())
        },
        client_phone: Some(details.phone.clone()),
        client_email: Some(details.email.clone()),
    })
}

async fn step_back(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let (key, _) = wizard_key(&req);
    let mut wizard = wizard_for(&state, &key).await;
    wizard.back();
    store_wizard(&state, &key, wizard).await;
    Ok(back_to_wizard())
}

async fn restart(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    let (key, _) = wizard_key(&req);
    let mut wizard = wizard_for(&state, &key).await;
    wizard.restart();
    store_wizard(&state, &key, wizard).await;
    Ok(back_to_wizard())
}

async fn show_login(query: web::Query<LoginQuery>) -> Result<HttpResponse> {
    Ok(render(LoginTemplate {
        errors: Vec::new(),
        next: sanitize_next(query.next.as_deref()),
        username: String::new(),
    }))
}

async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let next = sanitize_next(form.next.as_deref());

    match state.auth.login(form.username.trim(), &form.password).await {
        Some(token) => Ok(HttpResponse::SeeOther()
            .append_header((header::LOCATION, next))
            .cookie(auth_cookie(&req, &token))
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()),
        None => Ok(render(LoginTemplate {
            errors: vec!["Invalid username or password.".to_string()],
            next,
            username: form.username,
        })),
    }
}

/// Only admin paths are valid post-login targets.
fn sanitize_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with("/admin") => path.to_string(),
        _ => "/admin/dashboard".to_string(),
    }
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    if let Some(token) = auth_token(&req) {
        state.auth.logout(&token).await;
    }
    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/"))
        .cookie(clear_auth_cookie(&req))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_target_must_stay_under_admin() {
        assert_eq!(sanitize_next(Some("/admin/services")), "/admin/services");
        assert_eq!(sanitize_next(Some("https://evil.example")), "/admin/dashboard");
        assert_eq!(sanitize_next(Some("/etc/passwd")), "/admin/dashboard");
        assert_eq!(sanitize_next(None), "/admin/dashboard");
    }
}
