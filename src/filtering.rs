//! Pure predicates behind the admin list views. All criteria are
//! conjunctive; `None` means the filter is inactive.

use chrono::NaiveDate;

use crate::models::{Appointment, AppointmentStatus, Service, ServiceStatus};

pub fn filter_appointments(
    all: &[Appointment],
    date: Option<NaiveDate>,
    status: Option<AppointmentStatus>,
    service_name: Option<&str>,
) -> Vec<Appointment> {
    all.iter()
        .filter(|appt| date.map_or(true, |date| appt.date == date))
        .filter(|appt| status.map_or(true, |status| appt.status == status))
        .filter(|appt| service_name.map_or(true, |name| appt.service_name == name))
        .cloned()
        .collect()
}

/// Search matches case-insensitively against name or description.
pub fn filter_services(
    all: &[Service],
    search: &str,
    category: Option<&str>,
    status: Option<ServiceStatus>,
) -> Vec<Service> {
    let needle = search.trim().to_lowercase();
    all.iter()
        .filter(|service| {
            needle.is_empty()
                || service.name.to_lowercase().contains(&needle)
                || service.description.to_lowercase().contains(&needle)
        })
        .filter(|service| category.map_or(true, |category| service.category == category))
        .filter(|service| status.map_or(true, |status| service.status == status))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntityStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[test]
    fn neutral_filters_are_identity() {
        let store = EntityStore::with_defaults(today());
        let services = filter_services(store.services(), "", None, None);
        assert_eq!(services.len(), store.services().len());

        let appointments = filter_appointments(store.appointments(), None, None, None);
        assert_eq!(appointments.len(), store.appointments().len());
    }

    #[test]
    fn results_are_subsets_of_input() {
        let store = EntityStore::with_defaults(today());
        let filtered = filter_appointments(
            store.appointments(),
            Some(today()),
            Some(AppointmentStatus::Confirmed),
            None,
        );
        for appt in &filtered {
            assert!(store.appointments().iter().any(|a| a.id == appt.id));
        }
    }

    #[test]
    fn date_matches_exact_day_only() {
        let store = EntityStore::with_defaults(today());
        let filtered = filter_appointments(store.appointments(), Some(today()), None, None);
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|appt| appt.date == today()));
    }

    #[test]
    fn predicates_are_conjunctive() {
        let store = EntityStore::with_defaults(today());
        let filtered = filter_appointments(
            store.appointments(),
            Some(today()),
            Some(AppointmentStatus::Confirmed),
            Some("Haircut"),
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].client_name, "Jane Smith");

        let none = filter_appointments(
            store.appointments(),
            Some(today()),
            Some(AppointmentStatus::Completed),
            Some("Haircut"),
        );
        assert!(none.is_empty());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let store = EntityStore::with_defaults(today());
        let hits = filter_services(store.services(), "cut", None, None);
        assert!(hits.iter().any(|s| s.id == "1"));
        let upper = filter_services(store.services(), "CUT", None, None);
        assert_eq!(hits.len(), upper.len());
        // Description text matches too.
        let cleansing = filter_services(store.services(), "cleansing", None, None);
        assert_eq!(cleansing.len(), 1);
        assert_eq!(cleansing[0].name, "Facial");
    }

    #[test]
    fn search_with_wrong_category_yields_nothing() {
        let store = EntityStore::with_defaults(today());
        let hits = filter_services(store.services(), "cut", Some("Nails"), None);
        assert!(hits.is_empty());
    }

    #[test]
    fn status_filter_narrows_services() {
        let store = EntityStore::with_defaults(today());
        let inactive = filter_services(store.services(), "", None, Some(ServiceStatus::Inactive));
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].name, "Hair Coloring");
    }
}
