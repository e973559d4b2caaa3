//! The public booking flow: a linear five-step machine that accumulates a
//! draft as the visitor moves forward. Transition methods report whether
//! the input was accepted; rejected calls leave step and draft untouched.

use chrono::NaiveDate;

use crate::models::{Service, TimeSlot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    SelectService,
    SelectDate,
    SelectTime,
    EnterDetails,
    Confirmed,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::SelectService => 1,
            WizardStep::SelectDate => 2,
            WizardStep::SelectTime => 3,
            WizardStep::EnterDetails => 4,
            WizardStep::Confirmed => 5,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub notes: String,
}

impl ClientDetails {
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.phone.trim().is_empty()
            && !self.email.trim().is_empty()
    }
}

/// Selections gathered so far. Backward navigation keeps earlier choices,
/// so stepping forward again re-shows them.
#[derive(Clone, Debug, Default)]
pub struct BookingDraft {
    pub service: Option<Service>,
    pub date: Option<NaiveDate>,
    pub slot: Option<TimeSlot>,
    pub details: Option<ClientDetails>,
}

impl BookingDraft {
    pub fn is_empty(&self) -> bool {
        self.service.is_none()
            && self.date.is_none()
            && self.slot.is_none()
            && self.details.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct BookingWizard {
    step: WizardStep,
    draft: BookingDraft,
}

impl Default for BookingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::SelectService,
            draft: BookingDraft::default(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn select_service(&mut self, service: Service) -> bool {
        if self.step != WizardStep::SelectService {
            return false;
        }
        self.draft.service = Some(service);
        self.step = WizardStep::SelectDate;
        true
    }

    pub fn select_date(&mut self, date: NaiveDate) -> bool {
        if self.step != WizardStep::SelectDate {
            return false;
        }
        self.draft.date = Some(date);
        self.step = WizardStep::SelectTime;
        true
    }

    /// Unavailable slots are ignored: the step and draft stay put.
    pub fn select_time(&mut self, slot: TimeSlot) -> bool {
        if self.step != WizardStep::SelectTime || !slot.available {
            return false;
        }
        self.draft.slot = Some(slot);
        self.step = WizardStep::EnterDetails;
        true
    }

    pub fn submit_details(&mut self, details: ClientDetails) -> bool {
        if self.step != WizardStep::EnterDetails || !details.is_complete() {
            return false;
        }
        self.draft.details = Some(details);
        self.step = WizardStep::Confirmed;
        true
    }

    /// Steps back without clearing the destination's earlier choice.
    pub fn back(&mut self) -> bool {
        self.step = match self.step {
            WizardStep::SelectDate => WizardStep::SelectService,
            WizardStep::SelectTime => WizardStep::SelectDate,
            WizardStep::EnterDetails => WizardStep::SelectTime,
            WizardStep::SelectService | WizardStep::Confirmed => return false,
        };
        true
    }

    /// "Book another appointment": only meaningful once confirmed.
    pub fn restart(&mut self) -> bool {
        if self.step != WizardStep::Confirmed {
            return false;
        }
        self.step = WizardStep::SelectService;
        self.draft = BookingDraft::default();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceStatus;

    fn haircut() -> Service {
        Service {
            id: "1".to_string(),
            name: "Haircut".to_string(),
            description: "Professional haircut with styling".to_string(),
            price: 50.0,
            duration: 30,
            category: "Hair".to_string(),
            status: ServiceStatus::Active,
        }
    }

    fn slot(available: bool) -> TimeSlot {
        TimeSlot {
            id: "t1".to_string(),
            time: "9:00 AM".to_string(),
            available,
        }
    }

    fn details() -> ClientDetails {
        ClientDetails {
            name: "Jane Smith".to_string(),
            phone: "555-123-4567".to_string(),
            email: "jane@example.com".to_string(),
            notes: String::new(),
        }
    }

    fn a_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[test]
    fn full_traversal_then_restart_clears_draft() {
        let mut wizard = BookingWizard::new();
        assert!(wizard.select_service(haircut()));
        assert!(wizard.select_date(a_date()));
        assert!(wizard.select_time(slot(true)));
        assert!(wizard.submit_details(details()));
        assert_eq!(wizard.step(), WizardStep::Confirmed);

        assert!(wizard.restart());
        assert_eq!(wizard.step(), WizardStep::SelectService);
        assert!(wizard.draft().is_empty());
    }

    #[test]
    fn unavailable_slot_is_a_noop() {
        let mut wizard = BookingWizard::new();
        wizard.select_service(haircut());
        wizard.select_date(a_date());
        assert!(!wizard.select_time(slot(false)));
        assert_eq!(wizard.step(), WizardStep::SelectTime);
        assert!(wizard.draft().slot.is_none());
    }

    #[test]
    fn transitions_rejected_outside_their_step() {
        let mut wizard = BookingWizard::new();
        assert!(!wizard.select_date(a_date()));
        assert!(!wizard.select_time(slot(true)));
        assert!(!wizard.submit_details(details()));
        assert!(!wizard.restart());
        assert_eq!(wizard.step(), WizardStep::SelectService);
        assert!(wizard.draft().is_empty());
    }

    #[test]
    fn incomplete_details_do_not_advance() {
        let mut wizard = BookingWizard::new();
        wizard.select_service(haircut());
        wizard.select_date(a_date());
        wizard.select_time(slot(true));
        let mut missing = details();
        missing.email = "  ".to_string();
        assert!(!wizard.submit_details(missing));
        assert_eq!(wizard.step(), WizardStep::EnterDetails);
        assert!(wizard.draft().details.is_none());
    }

    #[test]
    fn back_preserves_earlier_selections() {
        let mut wizard = BookingWizard::new();
        wizard.select_service(haircut());
        wizard.select_date(a_date());
        assert!(wizard.back());
        assert_eq!(wizard.step(), WizardStep::SelectDate);
        // The service chosen at step 1 survives the round trip.
        assert_eq!(wizard.draft().service.as_ref().unwrap().id, "1");
        assert_eq!(wizard.draft().date, Some(a_date()));
    }

    #[test]
    fn back_is_noop_at_the_edges() {
        let mut wizard = BookingWizard::new();
        assert!(!wizard.back());
        wizard.select_service(haircut());
        wizard.select_date(a_date());
        wizard.select_time(slot(true));
        wizard.submit_details(details());
        assert!(!wizard.back());
        assert_eq!(wizard.step(), WizardStep::Confirmed);
    }
}
