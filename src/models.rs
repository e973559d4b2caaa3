use chrono::NaiveDate;

pub const ROLE_ADMIN: &str = "admin";

/// Categories offered in the service form. The field itself stays a free
/// string so records with other labels keep working.
pub const CATEGORIES: [&str; 5] = ["Hair", "Nails", "Skin", "Massage", "Other"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceStatus {
    Active,
    Inactive,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        ServiceStatus::Active
    }
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Active => "active",
            ServiceStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ServiceStatus::Active),
            "inactive" => Some(ServiceStatus::Inactive),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration: u32,
    pub category: String,
    pub status: ServiceStatus,
}

#[derive(Clone, Debug)]
pub struct Appointment {
    pub id: String,
    pub client_name: String,
    /// None for seeded bookings whose service never existed in the catalog;
    /// wizard bookings always carry the id.
    pub service_id: Option<String>,
    pub service_name: String,
    pub date: NaiveDate,
    pub time: String,
    pub duration: u32,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub client_phone: Option<String>,
    pub client_email: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeSlot {
    pub id: String,
    pub time: String,
    pub available: bool,
}

#[derive(Clone, Debug)]
pub struct AuthSession {
    pub username: String,
    pub name: String,
    pub role: String,
}
