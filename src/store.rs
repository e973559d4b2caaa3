use chrono::{Duration, NaiveDate};

use crate::{
    auth::new_id,
    models::{Appointment, AppointmentStatus, Service, ServiceStatus},
};

/// Fields for a new service, collected from the admin form.
#[derive(Clone, Debug, Default)]
pub struct ServiceDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration: u32,
    pub category: String,
    pub status: ServiceStatus,
}

impl ServiceDraft {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Service name is required.".to_string());
        }
        if self.price < 0.0 {
            errors.push("Price must not be negative.".to_string());
        }
        if self.duration == 0 {
            errors.push("Duration must be at least one minute.".to_string());
        }
        errors
    }
}

/// Partial update for an existing service. `None` leaves the field as is.
#[derive(Clone, Debug, Default)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub duration: Option<u32>,
    pub category: Option<String>,
    pub status: Option<ServiceStatus>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// A non-cancelled appointment still references the service.
    InUse,
}

/// Session-lifetime collections of services and appointments. No
/// persistence; everything is rebuilt from the seed on restart.
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
    services: Vec<Service>,
    appointments: Vec<Appointment>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the demo catalog and mock bookings, dated
    /// relative to `today`.
    pub fn with_defaults(today: NaiveDate) -> Self {
        Self {
            services: seed_services(),
            appointments: seed_appointments(today),
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|service| service.id == id)
    }

    pub fn appointment(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|appt| appt.id == id)
    }

    pub fn create_service(&mut self, draft: ServiceDraft) -> Result<Service, Vec<String>> {
        let errors = draft.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        let service = Service {
            id: new_id(),
            name: draft.name.trim().to_string(),
            description: draft.description.trim().to_string(),
            price: draft.price,
            duration: draft.duration,
            category: draft.category,
            status: draft.status,
        };
        self.services.push(service.clone());
        Ok(service)
    }

    /// Merges `patch` into the matching service. Returns false (and changes
    /// nothing) when the id is unknown.
    pub fn update_service(&mut self, id: &str, patch: ServicePatch) -> bool {
        let Some(service) = self.services.iter_mut().find(|service| service.id == id) else {
            return false;
        };
        if let Some(name) = patch.name {
            service.name = name;
        }
        if let Some(description) = patch.description {
            service.description = description;
        }
        if let Some(price) = patch.price {
            service.price = price;
        }
        if let Some(duration) = patch.duration {
            service.duration = duration;
        }
        if let Some(category) = patch.category {
            service.category = category;
        }
        if let Some(status) = patch.status {
            service.status = status;
        }
        true
    }

    /// Deletion is refused while any non-cancelled appointment references
    /// the service, so booking history keeps resolving.
    pub fn delete_service(&mut self, id: &str) -> DeleteOutcome {
        if !self.services.iter().any(|service| service.id == id) {
            return DeleteOutcome::NotFound;
        }
        let referenced = self.appointments.iter().any(|appt| {
            appt.service_id.as_deref() == Some(id) && appt.status != AppointmentStatus::Cancelled
        });
        if referenced {
            return DeleteOutcome::InUse;
        }
        self.services.retain(|service| service.id != id);
        DeleteOutcome::Deleted
    }

    pub fn add_appointment(&mut self, appointment: Appointment) {
        self.appointments.push(appointment);
    }

    pub fn set_appointment_status(&mut self, id: &str, status: AppointmentStatus) -> bool {
        match self.appointments.iter_mut().find(|appt| appt.id == id) {
            Some(appt) => {
                appt.status = status;
                true
            }
            None => false,
        }
    }

    pub fn count_appointments(&self, status: Option<AppointmentStatus>) -> usize {
        self.appointments
            .iter()
            .filter(|appt| status.map_or(true, |status| appt.status == status))
            .count()
    }

    /// Distinct service names across all appointments, for the filter
    /// dropdown. Sorted for a stable menu.
    pub fn appointment_service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .appointments
            .iter()
            .map(|appt| appt.service_name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

fn seed_services() -> Vec<Service> {
    vec![
        Service {
            id: "1".to_string(),
            name: "Haircut".to_string(),
            description: "Professional haircut with styling".to_string(),
            price: 50.0,
            duration: 30,
            category: "Hair".to_string(),
            status: ServiceStatus::Active,
        },
        Service {
            id: "2".to_string(),
            name: "Manicure".to_string(),
            description: "Basic manicure with polish".to_string(),
            price: 35.0,
            duration: 45,
            category: "Nails".to_string(),
            status: ServiceStatus::Active,
        },
        Service {
            id: "3".to_string(),
            name: "Facial".to_string(),
            description: "Deep cleansing facial treatment".to_string(),
            price: 75.0,
            duration: 60,
            category: "Skin".to_string(),
            status: ServiceStatus::Active,
        },
        Service {
            id: "4".to_string(),
            name: "Hair Coloring".to_string(),
            description: "Full hair coloring service".to_string(),
            price: 120.0,
            duration: 90,
            category: "Hair".to_string(),
            status: ServiceStatus::Inactive,
        },
    ]
}

fn seed_appointments(today: NaiveDate) -> Vec<Appointment> {
    vec![
        Appointment {
            id: "1".to_string(),
            client_name: "Jane Smith".to_string(),
            service_id: Some("1".to_string()),
            service_name: "Haircut".to_string(),
            date: today,
            time: "10:00 AM".to_string(),
            duration: 30,
            status: AppointmentStatus::Confirmed,
            notes: Some("First time client".to_string()),
            client_phone: Some("555-123-4567".to_string()),
            client_email: Some("jane@example.com".to_string()),
        },
        Appointment {
            id: "2".to_string(),
            client_name: "John Doe".to_string(),
            service_id: None,
            service_name: "Massage".to_string(),
            date: today,
            time: "2:00 PM".to_string(),
            duration: 60,
            status: AppointmentStatus::Pending,
            notes: None,
            client_phone: Some("555-987-6543".to_string()),
            client_email: Some("john@example.com".to_string()),
        },
        Appointment {
            id: "3".to_string(),
            client_name: "Alice Johnson".to_string(),
            service_id: Some("3".to_string()),
            service_name: "Facial".to_string(),
            date: today + Duration::days(1),
            time: "11:30 AM".to_string(),
            duration: 45,
            status: AppointmentStatus::Confirmed,
            notes: None,
            client_phone: Some("555-555-5555".to_string()),
            client_email: Some("alice@example.com".to_string()),
        },
        Appointment {
            id: "4".to_string(),
            client_name: "Bob Williams".to_string(),
            service_id: Some("2".to_string()),
            service_name: "Manicure".to_string(),
            date: today - Duration::days(1),
            time: "3:15 PM".to_string(),
            duration: 45,
            status: AppointmentStatus::Completed,
            notes: None,
            client_phone: Some("555-222-3333".to_string()),
            client_email: Some("bob@example.com".to_string()),
        },
        Appointment {
            id: "5".to_string(),
            client_name: "Carol Taylor".to_string(),
            service_id: Some("1".to_string()),
            service_name: "Haircut".to_string(),
            date: today,
            time: "4:30 PM".to_string(),
            duration: 30,
            status: AppointmentStatus::Cancelled,
            notes: Some("Reschedule needed".to_string()),
            client_phone: Some("555-444-7777".to_string()),
            client_email: Some("carol@example.com".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn draft(name: &str) -> ServiceDraft {
        ServiceDraft {
            name: name.to_string(),
            description: "desc".to_string(),
            price: 10.0,
            duration: 30,
            category: "Other".to_string(),
            status: ServiceStatus::Active,
        }
    }

    #[test]
    fn create_generates_unique_id_and_appends() {
        let mut store = EntityStore::with_defaults(today());
        let before = store.services().len();
        let created = store.create_service(draft("Pedicure")).unwrap();
        assert_eq!(store.services().len(), before + 1);
        assert!(store.service(&created.id).is_some());
        assert!(store.services().iter().filter(|s| s.id == created.id).count() == 1);
    }

    #[test]
    fn create_rejects_invalid_fields() {
        let mut store = EntityStore::new();
        let mut bad = draft("");
        bad.price = -1.0;
        bad.duration = 0;
        let errors = store.create_service(bad).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(store.services().is_empty());
    }

    #[test]
    fn update_merges_only_supplied_fields() {
        let mut store = EntityStore::new();
        let created = store.create_service(draft("Waxing")).unwrap();
        let patch = ServicePatch {
            name: Some("X".to_string()),
            ..ServicePatch::default()
        };
        assert!(store.update_service(&created.id, patch));
        let updated = store.service(&created.id).unwrap();
        assert_eq!(updated.name, "X");
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.price, created.price);
        assert_eq!(updated.duration, created.duration);
        assert_eq!(updated.category, created.category);
        assert_eq!(updated.status, created.status);
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let mut store = EntityStore::with_defaults(today());
        let snapshot = store.services().to_vec();
        assert!(!store.update_service("missing", ServicePatch::default()));
        assert_eq!(store.services().len(), snapshot.len());
    }

    #[test]
    fn delete_then_update_leaves_store_unchanged() {
        let mut store = EntityStore::new();
        let created = store.create_service(draft("Trim")).unwrap();
        assert_eq!(store.delete_service(&created.id), DeleteOutcome::Deleted);
        let size = store.services().len();
        let patch = ServicePatch {
            name: Some("Y".to_string()),
            ..ServicePatch::default()
        };
        assert!(!store.update_service(&created.id, patch));
        assert_eq!(store.services().len(), size);
    }

    #[test]
    fn delete_refused_while_referenced() {
        let mut store = EntityStore::with_defaults(today());
        // Service "1" backs the confirmed Jane Smith booking.
        assert_eq!(store.delete_service("1"), DeleteOutcome::InUse);
        assert!(store.service("1").is_some());
    }

    #[test]
    fn delete_allowed_once_references_are_cancelled() {
        let mut store = EntityStore::with_defaults(today());
        assert_eq!(store.delete_service("2"), DeleteOutcome::InUse);
        assert!(store.set_appointment_status("4", AppointmentStatus::Cancelled));
        assert_eq!(store.delete_service("2"), DeleteOutcome::Deleted);
        assert!(store.service("2").is_none());
    }

    #[test]
    fn delete_unknown_id_reports_not_found() {
        let mut store = EntityStore::new();
        assert_eq!(store.delete_service("nope"), DeleteOutcome::NotFound);
    }

    #[test]
    fn status_update_persists() {
        let mut store = EntityStore::with_defaults(today());
        assert!(store.set_appointment_status("2", AppointmentStatus::Confirmed));
        assert_eq!(
            store.appointment("2").unwrap().status,
            AppointmentStatus::Confirmed
        );
        assert!(!store.set_appointment_status("missing", AppointmentStatus::Pending));
    }

    #[test]
    fn counts_by_status() {
        let store = EntityStore::with_defaults(today());
        assert_eq!(store.count_appointments(None), 5);
        assert_eq!(
            store.count_appointments(Some(AppointmentStatus::Confirmed)),
            2
        );
        assert_eq!(
            store.count_appointments(Some(AppointmentStatus::Cancelled)),
            1
        );
    }
}
