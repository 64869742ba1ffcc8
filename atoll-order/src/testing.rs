use atoll_core::timeslot::TimeSlot;
use chrono::NaiveDate;

use crate::models::{BookingDraft, BookingFormat, PassengerCategory};
use crate::roster::PassengerField;

pub fn travel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 3).unwrap()
}

/// Male -> Dhigurah, two adults with complete details, ready for payment.
pub fn payment_ready_draft() -> BookingDraft {
    let mut draft = BookingDraft::new(BookingFormat::Ferry);
    draft.set_from("Male").unwrap();
    draft.set_to("Dhigurah").unwrap();
    draft.set_date(Some(travel_date())).unwrap();
    draft.set_time(Some(TimeSlot::Morning)).unwrap();
    draft
        .handle_passenger_count_change(PassengerCategory::Adults, 2)
        .unwrap();
    draft.submit_trip().unwrap();

    draft.update_passenger(1, PassengerField::Name, "Ahmed Naseem").unwrap();
    draft.update_passenger(1, PassengerField::Passport, "P111").unwrap();
    draft
        .update_passenger(1, PassengerField::Email, "ahmed@example.com")
        .unwrap();
    draft.update_passenger(1, PassengerField::Phone, "7771234").unwrap();
    draft.update_passenger(1, PassengerField::CountryCode, "+960").unwrap();
    draft.update_passenger(2, PassengerField::Name, "Mariyam").unwrap();
    draft.update_passenger(2, PassengerField::Passport, "P222").unwrap();
    draft.submit_passengers().unwrap();
    draft
}
