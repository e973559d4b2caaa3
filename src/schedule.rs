//! Availability is derived, not stored: the clinic's working hours minus
//! whatever is already booked on the chosen day.

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};

use crate::models::{Appointment, AppointmentStatus, TimeSlot};

/// Working day: hourly start times from 9:00 AM, last one at 4:00 PM,
/// doors close at 5:00 PM.
const OPEN_HOUR: u32 = 9;
const LAST_START_HOUR: u32 = 16;
const CLOSE_HOUR: u32 = 17;

const TIME_FORMAT: &str = "%I:%M %p";

#[derive(Clone, Debug)]
pub struct DateOption {
    /// `%Y-%m-%d`, the form value.
    pub value: String,
    /// e.g. "Mon, Jun 10".
    pub display: String,
}

/// The next `count` calendar days starting today, for the wizard's date
/// step.
pub fn upcoming_dates(today: NaiveDate, count: u32) -> Vec<DateOption> {
    (0..count)
        .map(|offset| {
            let date = today + Duration::days(offset as i64);
            DateOption {
                value: date.format("%Y-%m-%d").to_string(),
                display: date.format("%a, %b %-d").to_string(),
            }
        })
        .collect()
}

/// Slots for booking a `duration`-minute service on `date`. A slot is
/// unavailable when the service would not finish before closing, or when a
/// non-cancelled appointment on that day overlaps it.
pub fn derive_slots(appointments: &[Appointment], date: NaiveDate, duration: u32) -> Vec<TimeSlot> {
    let booked: Vec<(u32, u32)> = appointments
        .iter()
        .filter(|appt| appt.date == date && appt.status != AppointmentStatus::Cancelled)
        .filter_map(|appt| parse_display_time(&appt.time).map(|start| (start, appt.duration)))
        .collect();

    (OPEN_HOUR..=LAST_START_HOUR)
        .enumerate()
        .map(|(index, hour)| {
            let start = hour * 60;
            let fits = start + duration <= CLOSE_HOUR * 60;
            let clash = booked
                .iter()
                .any(|&(b_start, b_dur)| b_start < start + duration && start < b_start + b_dur);
            TimeSlot {
                id: format!("t{}", index + 1),
                time: display_time(start),
                available: fits && !clash,
            }
        })
        .collect()
}

/// "10:00 AM" -> minutes since midnight.
pub fn parse_display_time(value: &str) -> Option<u32> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .ok()
        .map(|time| time.hour() * 60 + time.minute())
}

fn display_time(minutes: u32) -> String {
    let time = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
        .unwrap_or(NaiveTime::MIN);
    time.format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntityStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[test]
    fn parses_and_prints_display_times() {
        assert_eq!(parse_display_time("9:00 AM"), Some(9 * 60));
        assert_eq!(parse_display_time("12:00 PM"), Some(12 * 60));
        assert_eq!(parse_display_time("4:30 PM"), Some(16 * 60 + 30));
        assert_eq!(parse_display_time("not a time"), None);
        assert_eq!(display_time(9 * 60), "9:00 AM");
        assert_eq!(display_time(13 * 60), "1:00 PM");
    }

    #[test]
    fn working_day_has_eight_hourly_slots() {
        let slots = derive_slots(&[], today(), 30);
        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0].time, "9:00 AM");
        assert_eq!(slots[7].time, "4:00 PM");
        assert!(slots.iter().all(|slot| slot.available));
    }

    #[test]
    fn booked_hours_are_unavailable() {
        let store = EntityStore::with_defaults(today());
        // Today holds 10:00 AM (30 min, confirmed) and 2:00 PM (60 min,
        // pending); the 4:30 PM booking is cancelled and ignored.
        let slots = derive_slots(store.appointments(), today(), 30);
        let available: Vec<bool> = slots.iter().map(|slot| slot.available).collect();
        assert_eq!(
            available,
            vec![true, false, true, true, true, false, true, true]
        );
    }

    #[test]
    fn other_days_do_not_block() {
        let store = EntityStore::with_defaults(today());
        let slots = derive_slots(store.appointments(), today() + Duration::days(3), 30);
        assert!(slots.iter().all(|slot| slot.available));
    }

    #[test]
    fn long_services_cannot_start_near_closing() {
        let slots = derive_slots(&[], today(), 90);
        // 4:00 PM + 90 minutes would run past the 5:00 PM close.
        assert!(!slots[7].available);
        assert!(slots[6].available);
    }

    #[test]
    fn overlap_covers_partial_hours() {
        let store = EntityStore::with_defaults(today());
        // A 90-minute booking starting at 9:00 AM would collide with the
        // 10:00 AM appointment.
        let slots = derive_slots(store.appointments(), today(), 90);
        assert!(!slots[0].available);
    }
}
