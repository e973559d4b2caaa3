use actix_web::{http::header, middleware::from_fn, web, HttpResponse, Result};
use askama::Template;
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::{
    auth::session_guard,
    filtering::{filter_appointments, filter_services},
    models::{
        Appointment, AppointmentStatus, AuthSession, Service, ServiceStatus, CATEGORIES,
    },
    state::AppState,
    store::{DeleteOutcome, ServiceDraft, ServicePatch},
    templates::render,
};

#[derive(Clone, Debug)]
struct StatCard {
    label: String,
    value: usize,
}

#[derive(Clone, Debug)]
struct StatusOption {
    value: &'static str,
    selected: bool,
}

#[derive(Clone, Debug)]
struct ChoiceOption {
    value: String,
    selected: bool,
}

#[derive(Clone, Debug)]
struct AppointmentView {
    id: String,
    client_name: String,
    service_name: String,
    date_display: String,
    time: String,
    duration: u32,
    status: String,
    notes: String,
    has_notes: bool,
    client_phone: String,
    client_email: String,
    statuses: Vec<StatusOption>,
}

#[derive(Clone, Debug)]
struct ServiceRow {
    id: String,
    name: String,
    description: String,
    price_display: String,
    duration: u32,
    category: String,
    status: String,
}

/// Form echo for the create/edit service forms; numbers stay strings so a
/// rejected submission round-trips exactly what was typed.
#[derive(Clone, Debug, Default)]
struct ServiceFormView {
    name: String,
    description: String,
    price: String,
    duration: String,
    category: String,
    status: String,
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
struct AdminDashboardTemplate {
    admin_name: String,
    stats: Vec<StatCard>,
    today: Vec<AppointmentView>,
}

#[derive(Template)]
#[template(path = "admin_appointments.html")]
struct AdminAppointmentsTemplate {
    admin_name: String,
    appointments: Vec<AppointmentView>,
    date_value: String,
    status_options: Vec<StatusOption>,
    service_options: Vec<ChoiceOption>,
}

#[derive(Template)]
#[template(path = "admin_services.html")]
struct AdminServicesTemplate {
    admin_name: String,
    services: Vec<ServiceRow>,
    search: String,
    category_options: Vec<ChoiceOption>,
    status_options: Vec<StatusOption>,
    form: ServiceFormView,
    form_categories: Vec<ChoiceOption>,
    errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "admin_service_edit.html")]
struct ServiceEditTemplate {
    admin_name: String,
    service_id: String,
    form: ServiceFormView,
    form_categories: Vec<ChoiceOption>,
    errors: Vec<String>,
}

#[derive(Deserialize)]
struct AppointmentQuery {
    date: Option<String>,
    status: Option<String>,
    service: Option<String>,
}

#[derive(Deserialize)]
struct StatusUpdateForm {
    status: String,
}

#[derive(Deserialize)]
struct ServiceQuery {
    search: Option<String>,
    category: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct ServiceForm {
    name: String,
    description: String,
    price: String,
    duration: String,
    category: String,
    status: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(from_fn(session_guard))
            .service(web::resource("").route(web::get().to(index)))
            .service(web::resource("/").route(web::get().to(index)))
            .service(web::resource("/dashboard").route(web::get().to(dashboard)))
            .service(web::resource("/appointments").route(web::get().to(list_appointments)))
            .service(web::resource("/appointments/{id}").route(web::post().to(update_appointment)))
            .service(
                web::resource("/services")
                    .route(web::get().to(list_services))
                    .route(web::post().to(create_service)),
            )
            .service(
                web::resource("/services/{id}")
                    .route(web::get().to(edit_service))
                    .route(web::post().to(update_service)),
            )
            .service(web::resource("/services/{id}/delete").route(web::post().to(delete_service))),
    );
}

async fn index() -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, "/admin/dashboard"))
        .finish()
}

fn status_options(current: Option<AppointmentStatus>) -> Vec<StatusOption> {
    AppointmentStatus::ALL
        .iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            selected: current == Some(*status),
        })
        .collect()
}

fn to_view(appt: &Appointment) -> AppointmentView {
    AppointmentView {
        id: appt.id.clone(),
        client_name: appt.client_name.clone(),
        service_name: appt.service_name.clone(),
        date_display: appt.date.format("%b %-d, %Y").to_string(),
        time: appt.time.clone(),
        duration: appt.duration,
        status: appt.status.as_str().to_string(),
        notes: appt.notes.clone().unwrap_or_default(),
        has_notes: appt.notes.is_some(),
        client_phone: appt.client_phone.clone().unwrap_or_default(),
        client_email: appt.client_email.clone().unwrap_or_default(),
        statuses: status_options(Some(appt.status)),
    }
}

fn to_row(service: &Service) -> ServiceRow {
    ServiceRow {
        id: service.id.clone(),
        name: service.name.clone(),
        description: service.description.clone(),
        price_display: format!("${:.2}", service.price),
        duration: service.duration,
        category: service.category.clone(),
        status: service.status.as_str().to_string(),
    }
}

fn form_categories(current: &str) -> Vec<ChoiceOption> {
    CATEGORIES
        .iter()
        .map(|category| ChoiceOption {
            value: category.to_string(),
            selected: *category == current,
        })
        .collect()
}

async fn dashboard(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthSession>,
) -> Result<HttpResponse> {
    let store = state.store.lock().await;

    let stats = vec![
        StatCard {
            label: "Total appointments".to_string(),
            value: store.count_appointments(None),
        },
        StatCard {
            label: "Pending".to_string(),
            value: store.count_appointments(Some(AppointmentStatus::Pending)),
        },
        StatCard {
            label: "Confirmed".to_string(),
            value: store.count_appointments(Some(AppointmentStatus::Confirmed)),
        },
        StatCard {
            label: "Services offered".to_string(),
            value: store.services().len(),
        },
    ];

    let today_date = Local::now().date_naive();
    let today = filter_appointments(store.appointments(), Some(today_date), None, None)
        .iter()
        .map(to_view)
        .collect();

    Ok(render(AdminDashboardTemplate {
        admin_name: auth.name.clone(),
        stats,
        today,
    }))
}

async fn list_appointments(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthSession>,
    query: web::Query<AppointmentQuery>,
) -> Result<HttpResponse> {
    let store = state.store.lock().await;

    let date_value = query.date.clone().unwrap_or_default();
    let date = NaiveDate::parse_from_str(date_value.trim(), "%Y-%m-%d").ok();
    let status = query
        .status
        .as_deref()
        .and_then(AppointmentStatus::parse);
    let service = query
        .service
        .as_deref()
        .filter(|value| !value.is_empty() && *value != "all");

    let appointments = filter_appointments(store.appointments(), date, status, service)
        .iter()
        .map(to_view)
        .collect();

    let service_options = store
        .appointment_service_names()
        .into_iter()
        .map(|name| ChoiceOption {
            selected: service == Some(name.as_str()),
            value: name,
        })
        .collect();

    Ok(render(AdminAppointmentsTemplate {
        admin_name: auth.name.clone(),
        appointments,
        date_value,
        status_options: status_options(status),
        service_options,
    }))
}

async fn update_appointment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<StatusUpdateForm>,
) -> Result<HttpResponse> {
    let appointment_id = path.into_inner();
    if let Some(status) = AppointmentStatus::parse(form.status.trim()) {
        let mut store = state.store.lock().await;
        if !store.set_appointment_status(&appointment_id, status) {
            log::warn!("status update for unknown appointment {appointment_id}");
        }
    }
    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/admin/appointments"))
        .finish())
}

async fn services_page(
    state: &AppState,
    admin_name: String,
    query: &ServiceQuery,
    form: ServiceFormView,
    errors: Vec<String>,
) -> HttpResponse {
    let store = state.store.lock().await;

    let search = query.search.clone().unwrap_or_default();
    let category = query
        .category
        .as_deref()
        .filter(|value| !value.is_empty() && *value != "all");
    let status = query.status.as_deref().and_then(ServiceStatus::parse);

    let services = filter_services(store.services(), &search, category, status)
        .iter()
        .map(to_row)
        .collect();

    let category_options = CATEGORIES
        .iter()
        .map(|name| ChoiceOption {
            value: name.to_string(),
            selected: category == Some(name),
        })
        .collect();

    let status_options = [ServiceStatus::Active, ServiceStatus::Inactive]
        .iter()
        .map(|value| StatusOption {
            value: value.as_str(),
            selected: status == Some(*value),
        })
        .collect();

    let form_categories = form_categories(&form.category);

    render(AdminServicesTemplate {
        admin_name,
        services,
        search,
        category_options,
        status_options,
        form,
        form_categories,
        errors,
    })
}

async fn list_services(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthSession>,
    query: web::Query<ServiceQuery>,
) -> Result<HttpResponse> {
    Ok(services_page(
        &state,
        auth.name.clone(),
        &query,
        ServiceFormView::default(),
        Vec::new(),
    )
    .await)
}

/// Parses the shared create/edit form into typed fields, collecting
/// user-facing messages for anything that does not parse.
fn parse_service_form(form: &ServiceForm) -> (Option<(f64, u32, ServiceStatus)>, Vec<String>) {
    let mut errors = Vec::new();

    let price = match form.price.trim().parse::<f64>() {
        Ok(price) if price >= 0.0 => Some(price),
        Ok(_) => {
            errors.push("Price must not be negative.".to_string());
            None
        }
        Err(_) => {
            errors.push("Price must be a number.".to_string());
            None
        }
    };

    let duration = match form.duration.trim().parse::<u32>() {
        Ok(duration) if duration > 0 => Some(duration),
        _ => {
            errors.push("Duration must be a positive number of minutes.".to_string());
            None
        }
    };

    let status = match ServiceStatus::parse(form.status.trim()) {
        Some(status) => Some(status),
        None => {
            errors.push("Status must be active or inactive.".to_string());
            None
        }
    };

    if form.name.trim().is_empty() {
        errors.push("Service name is required.".to_string());
    }

    match (price, duration, status) {
        (Some(price), Some(duration), Some(status)) if errors.is_empty() => {
            (Some((price, duration, status)), errors)
        }
        _ => (None, errors),
    }
}

fn form_view(form: &ServiceForm) -> ServiceFormView {
    ServiceFormView {
        name: form.name.clone(),
        description: form.description.clone(),
        price: form.price.clone(),
        duration: form.duration.clone(),
        category: form.category.clone(),
        status: form.status.clone(),
    }
}

async fn create_service(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthSession>,
    form: web::Form<ServiceForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let neutral = ServiceQuery {
        search: None,
        category: None,
        status: None,
    };

    let (parsed, errors) = parse_service_form(&form);
    let Some((price, duration, status)) = parsed else {
        return Ok(services_page(&state, auth.name.clone(), &neutral, form_view(&form), errors)
            .await);
    };

    let draft = ServiceDraft {
        name: form.name.clone(),
        description: form.description.clone(),
        price,
        duration,
        category: form.category.clone(),
        status,
    };

    let created = state.store.lock().await.create_service(draft);
    match created {
        Ok(service) => {
            log::info!("{} created service {}", auth.name, service.name);
            Ok(HttpResponse::SeeOther()
                .append_header((header::LOCATION, "/admin/services"))
                .finish())
        }
        Err(errors) => Ok(services_page(
            &state,
            auth.name.clone(),
            &neutral,
            form_view(&form),
            errors,
        )
        .await),
    }
}

async fn edit_service(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthSession>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let service_id = path.into_inner();
    let store = state.store.lock().await;
    let Some(service) = store.service(&service_id) else {
        return Ok(HttpResponse::NotFound().body("Service not found"));
    };

    let form = ServiceFormView {
        name: service.name.clone(),
        description: service.description.clone(),
        price: format!("{}", service.price),
        duration: service.duration.to_string(),
        category: service.category.clone(),
        status: service.status.as_str().to_string(),
    };
    let form_categories = form_categories(&form.category);

    Ok(render(ServiceEditTemplate {
        admin_name: auth.name.clone(),
        service_id,
        form,
        form_categories,
        errors: Vec::new(),
    }))
}

async fn update_service(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthSession>,
    path: web::Path<String>,
    form: web::Form<ServiceForm>,
) -> Result<HttpResponse> {
    let service_id = path.into_inner();
    let form = form.into_inner();

    let (parsed, errors) = parse_service_form(&form);
    let Some((price, duration, status)) = parsed else {
        let view = form_view(&form);
        let form_categories = form_categories(&view.category);
        return Ok(render(ServiceEditTemplate {
            admin_name: auth.name.clone(),
            service_id,
            form: view,
            form_categories,
            errors,
        }));
    };

    let patch = ServicePatch {
        name: Some(form.name.trim().to_string()),
        description: Some(form.description.trim().to_string()),
        price: Some(price),
        duration: Some(duration),
        category: Some(form.category.clone()),
        status: Some(status),
    };

    if !state.store.lock().await.update_service(&service_id, patch) {
        return Ok(HttpResponse::NotFound().body("Service not found"));
    }

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/admin/services"))
        .finish())
}

async fn delete_service(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthSession>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let service_id = path.into_inner();
    let outcome = state.store.lock().await.delete_service(&service_id);

    match outcome {
        DeleteOutcome::Deleted | DeleteOutcome::NotFound => Ok(HttpResponse::SeeOther()
            .append_header((header::LOCATION, "/admin/services"))
            .finish()),
        DeleteOutcome::InUse => {
            let neutral = ServiceQuery {
                search: None,
                category: None,
                status: None,
            };
            Ok(services_page(
                &state,
                auth.name.clone(),
                &neutral,
                ServiceFormView::default(),
                vec!["This service still has booked appointments and cannot be deleted.".to_string()],
            )
            .await)
        }
    }
}
