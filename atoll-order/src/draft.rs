use atoll_catalog::pricing::{Fare, FareCalculator};
use atoll_core::booking::Passenger;
use atoll_core::timeslot::TimeSlot;
use chrono::NaiveDate;

use crate::models::{
    ActivitySelection, BookingDraft, BookingFormat, DraftKind, DraftStage, FerryTrip,
    PassengerCategory, PaymentProgress, ReturnTripDetails,
};
use crate::roster::{PassengerField, RosterError};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Please fill in all booking details")]
    InvalidBooking,

    #[error("Please fill in return trip date and time")]
    InvalidReturnBooking,

    #[error("Maximum {max} passengers per booking")]
    TooManyPassengers { max: usize },

    #[error("Operation only applies to {expected:?} bookings")]
    WrongKind { expected: BookingFormat },

    #[error("Draft has not reached the {required:?} step")]
    StageNotReached { required: DraftStage },

    #[error("Draft is already confirmed")]
    AlreadyConfirmed,

    #[error(transparent)]
    Roster(#[from] RosterError),
}

impl DraftError {
    pub fn code(&self) -> &'static str {
        match self {
            DraftError::InvalidBooking => "invalid_booking",
            DraftError::InvalidReturnBooking => "invalid_return_booking",
            DraftError::TooManyPassengers { .. } => "too_many_passengers",
            DraftError::WrongKind { .. } => "wrong_booking_kind",
            DraftError::StageNotReached { .. } => "stage_not_reached",
            DraftError::AlreadyConfirmed => "already_confirmed",
            DraftError::Roster(e) => e.code(),
        }
    }
}

fn mirror(trip: &FerryTrip, previous: Option<&ReturnTripDetails>) -> ReturnTripDetails {
    ReturnTripDetails {
        from: trip.to.clone(),
        to: trip.from.clone(),
        date: previous.and_then(|r| r.date),
        time: previous.and_then(|r| r.time),
    }
}

impl BookingDraft {
    fn ensure_editable(&self) -> Result<(), DraftError> {
        if self.stage == DraftStage::Confirmed {
            return Err(DraftError::AlreadyConfirmed);
        }
        Ok(())
    }

    /// An unpaid transaction or early-inserted row no longer matches the edited draft.
    fn rewind_to(&mut self, stage: DraftStage) {
        self.stage = stage;
        if !self.payment_complete {
            self.booking_id = None;
            self.payment = PaymentProgress::default();
        }
        self.touch();
    }

    /// Trip edits send the draft back to the first step.
    fn ferry_mut(&mut self) -> Result<&mut FerryTrip, DraftError> {
        self.ensure_editable()?;
        if !matches!(self.kind, DraftKind::Ferry(_)) {
            return Err(DraftError::WrongKind {
                expected: BookingFormat::Ferry,
            });
        }
        self.rewind_to(DraftStage::SelectTrip);
        match &mut self.kind {
            DraftKind::Ferry(trip) => Ok(trip),
            DraftKind::Activity(_) => Err(DraftError::WrongKind {
                expected: BookingFormat::Ferry,
            }),
        }
    }

    fn activity_mut(&mut self) -> Result<&mut ActivitySelection, DraftError> {
        self.ensure_editable()?;
        if !matches!(self.kind, DraftKind::Activity(_)) {
            return Err(DraftError::WrongKind {
                expected: BookingFormat::Activity,
            });
        }
        self.rewind_to(DraftStage::SelectTrip);
        match &mut self.kind {
            DraftKind::Activity(selection) => Ok(selection),
            DraftKind::Ferry(_) => Err(DraftError::WrongKind {
                expected: BookingFormat::Activity,
            }),
        }
    }

    fn rederive_return(trip: &mut FerryTrip) {
        if trip.return_trip {
            trip.return_details = Some(mirror(trip, trip.return_details.as_ref()));
        }
    }

    pub fn set_from(&mut self, from: impl Into<String>) -> Result<(), DraftError> {
        let trip = self.ferry_mut()?;
        trip.from = from.into();
        Self::rederive_return(trip);
        Ok(())
    }

    pub fn set_to(&mut self, to: impl Into<String>) -> Result<(), DraftError> {
        let trip = self.ferry_mut()?;
        trip.to = to.into();
        Self::rederive_return(trip);
        Ok(())
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) -> Result<(), DraftError> {
        let trip = self.ferry_mut()?;
        trip.date = date;
        Self::rederive_return(trip);
        Ok(())
    }

    pub fn set_time(&mut self, time: Option<TimeSlot>) -> Result<(), DraftError> {
        self.ferry_mut()?.time = time;
        Ok(())
    }

    pub fn set_speedboats(
        &mut self,
        outbound: Option<String>,
        inbound: Option<String>,
    ) -> Result<(), DraftError> {
        let trip = self.ferry_mut()?;
        trip.outbound_speedboat = outbound;
        trip.return_speedboat = inbound;
        Ok(())
    }

    /// Turning the return leg on mirrors the outbound endpoints.
    pub fn set_return_trip(&mut self, enabled: bool) -> Result<(), DraftError> {
        let trip = self.ferry_mut()?;
        trip.return_trip = enabled;
        trip.return_details = if enabled {
            Some(mirror(trip, None))
        } else {
            None
        };
        Ok(())
    }

    fn return_mut(&mut self) -> Result<&mut ReturnTripDetails, DraftError> {
        self.ferry_mut()?
            .return_details
            .as_mut()
            .ok_or(DraftError::InvalidReturnBooking)
    }

    pub fn set_return_date(&mut self, date: Option<NaiveDate>) -> Result<(), DraftError> {
        self.return_mut()?.date = date;
        Ok(())
    }

    pub fn set_return_time(&mut self, time: Option<TimeSlot>) -> Result<(), DraftError> {
        self.return_mut()?.time = time;
        Ok(())
    }

    pub fn set_activity(
        &mut self,
        activity: impl Into<String>,
        date: Option<NaiveDate>,
        time: Option<String>,
    ) -> Result<(), DraftError> {
        let selection = self.activity_mut()?;
        selection.activity = activity.into();
        selection.date = date;
        selection.time = time;
        Ok(())
    }

    /// Keeps `seats` equal to the sum of the three counts.
    pub fn handle_passenger_count_change(
        &mut self,
        category: PassengerCategory,
        value: u32,
    ) -> Result<(), DraftError> {
        self.ensure_editable()?;
        let max = self.format().max_passengers();
        if value as usize > max {
            return Err(DraftError::TooManyPassengers { max });
        }
        match category {
            PassengerCategory::Adults => self.passenger_counts.adults = value,
            PassengerCategory::Children => self.passenger_counts.children = value,
            PassengerCategory::Seniors => self.passenger_counts.seniors = value,
        }
        self.seats = self.passenger_counts.total();
        self.rewind_to(DraftStage::SelectTrip);
        Ok(())
    }

    pub fn is_round_trip(&self) -> bool {
        matches!(&self.kind, DraftKind::Ferry(trip) if trip.return_trip)
    }

    /// Checks run before leaving the trip selection step, in this order:
    /// missing fields, missing return leg, passenger limit.
    pub fn validate_trip(&self) -> Result<(), DraftError> {
        let complete = match &self.kind {
            DraftKind::Ferry(trip) => {
                !trip.from.trim().is_empty()
                    && !trip.to.trim().is_empty()
                    && trip.time.is_some()
                    && trip.date.is_some()
            }
            DraftKind::Activity(selection) => {
                !selection.activity.trim().is_empty()
                    && selection.date.is_some()
                    && selection.time.as_deref().is_some_and(|t| !t.trim().is_empty())
            }
        };
        if !complete || self.seats < 1 {
            return Err(DraftError::InvalidBooking);
        }

        if let DraftKind::Ferry(trip) = &self.kind {
            if trip.return_trip {
                let ok = trip
                    .return_details
                    .as_ref()
                    .is_some_and(|r| r.date.is_some() && r.time.is_some());
                if !ok {
                    return Err(DraftError::InvalidReturnBooking);
                }
            }
        }

        let max = self.format().max_passengers();
        if self.seats as usize > max {
            return Err(DraftError::TooManyPassengers { max });
        }
        Ok(())
    }

    /// Validates the selection and moves on to passenger details with a roster
    /// sized to the seat count.
    pub fn submit_trip(&mut self) -> Result<(), DraftError> {
        self.ensure_editable()?;
        self.validate_trip()?;
        let counts = self.passenger_counts;
        self.roster.resize_to(&counts);
        self.stage = DraftStage::PassengerDetails;
        self.touch();
        Ok(())
    }

    fn roster_editable(&mut self) -> Result<(), DraftError> {
        self.ensure_editable()?;
        if self.stage < DraftStage::PassengerDetails {
            return Err(DraftError::StageNotReached {
                required: DraftStage::PassengerDetails,
            });
        }
        self.rewind_to(DraftStage::PassengerDetails);
        Ok(())
    }

    pub fn add_passenger(&mut self) -> Result<u32, DraftError> {
        self.roster_editable()?;
        Ok(self.roster.add()?)
    }

    pub fn remove_passenger(&mut self, id: u32) -> Result<(), DraftError> {
        self.roster_editable()?;
        Ok(self.roster.remove(id)?)
    }

    pub fn update_passenger(
        &mut self,
        id: u32,
        field: PassengerField,
        value: &str,
    ) -> Result<(), DraftError> {
        self.roster_editable()?;
        Ok(self.roster.update(id, field, value)?)
    }

    pub fn submit_passengers(&mut self) -> Result<(), DraftError> {
        self.ensure_editable()?;
        if self.stage < DraftStage::PassengerDetails {
            return Err(DraftError::StageNotReached {
                required: DraftStage::PassengerDetails,
            });
        }
        self.roster.validate()?;
        self.stage = DraftStage::Payment;
        self.touch();
        Ok(())
    }

    /// Roster length once passengers were entered, the seat count before that.
    pub fn passenger_count(&self) -> u32 {
        if self.stage >= DraftStage::PassengerDetails {
            self.roster.len() as u32
        } else {
            self.seats
        }
    }

    pub fn fare(&self, calculator: &FareCalculator) -> Fare {
        let roster_len = if self.stage >= DraftStage::PassengerDetails {
            self.roster.len()
        } else {
            0
        };
        calculator.total_for(roster_len, self.seats, self.is_round_trip())
    }

    pub fn customer_reference(&self) -> String {
        match &self.kind {
            DraftKind::Ferry(trip) => format!("Booking for {} to {}", trip.from, trip.to),
            DraftKind::Activity(selection) => format!("Booking for {}", selection.activity),
        }
    }

    pub fn primary_passenger(&self) -> &Passenger {
        self.roster.primary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PassengerCounts;
    use chrono::Utc;
    use uuid::Uuid;

    fn ferry_draft(seats: u32) -> BookingDraft {
        let mut draft = BookingDraft::new(BookingFormat::Ferry);
        draft.set_from("Male").unwrap();
        draft.set_to("Dhigurah").unwrap();
        draft.set_time(Some(TimeSlot::Morning)).unwrap();
        draft.set_date(Some(Utc::now().date_naive())).unwrap();
        draft
            .handle_passenger_count_change(PassengerCategory::Adults, seats)
            .unwrap();
        draft
    }

    #[test]
    fn test_seats_track_counts() {
        let mut draft = BookingDraft::new(BookingFormat::Ferry);
        assert_eq!(draft.seats, 1);
        draft
            .handle_passenger_count_change(PassengerCategory::Children, 2)
            .unwrap();
        draft
            .handle_passenger_count_change(PassengerCategory::Seniors, 3)
            .unwrap();
        assert_eq!(draft.seats, 6);
        draft
            .handle_passenger_count_change(PassengerCategory::Adults, 0)
            .unwrap();
        assert_eq!(draft.seats, draft.passenger_counts.total());
        assert_eq!(draft.seats, 5);
    }

    #[test]
    fn test_return_trip_mirrors_outbound() {
        let mut draft = ferry_draft(1);
        draft.set_return_trip(true).unwrap();

        let DraftKind::Ferry(trip) = &draft.kind else {
            panic!("expected ferry draft");
        };
        let details = trip.return_details.as_ref().unwrap();
        assert_eq!(details.from, "Dhigurah");
        assert_eq!(details.to, "Male");
    }

    #[test]
    fn test_outbound_change_rederives_return_endpoints() {
        let mut draft = ferry_draft(1);
        draft.set_return_trip(true).unwrap();
        draft.set_return_time(Some(TimeSlot::Evening)).unwrap();
        draft.set_to("Maamigili").unwrap();

        let DraftKind::Ferry(trip) = &draft.kind else {
            panic!("expected ferry draft");
        };
        let details = trip.return_details.as_ref().unwrap();
        assert_eq!(details.from, "Maamigili");
        assert_eq!(details.to, "Male");
        assert_eq!(details.time, Some(TimeSlot::Evening));
    }

    #[test]
    fn test_validation_order() {
        let mut draft = BookingDraft::new(BookingFormat::Ferry);
        draft
            .handle_passenger_count_change(PassengerCategory::Adults, 15)
            .unwrap();
        draft
            .handle_passenger_count_change(PassengerCategory::Children, 5)
            .unwrap();
        assert_eq!(draft.validate_trip(), Err(DraftError::InvalidBooking));

        let mut draft = ferry_draft(15);
        draft
            .handle_passenger_count_change(PassengerCategory::Children, 5)
            .unwrap();
        draft.set_return_trip(true).unwrap();
        assert_eq!(draft.validate_trip(), Err(DraftError::InvalidReturnBooking));

        draft.set_return_trip(false).unwrap();
        assert_eq!(
            draft.validate_trip(),
            Err(DraftError::TooManyPassengers { max: 15 })
        );
    }

    #[test]
    fn test_sixteen_seats_blocks_submission() {
        let mut draft = ferry_draft(10);
        draft
            .handle_passenger_count_change(PassengerCategory::Children, 6)
            .unwrap();
        assert_eq!(draft.seats, 16);
        assert_eq!(
            draft.submit_trip(),
            Err(DraftError::TooManyPassengers { max: 15 })
        );
        assert_eq!(draft.stage, DraftStage::SelectTrip);
    }

    #[test]
    fn test_return_setters_require_return_leg() {
        let mut draft = ferry_draft(1);
        assert_eq!(
            draft.set_return_date(Some(Utc::now().date_naive())),
            Err(DraftError::InvalidReturnBooking)
        );
    }

    #[test]
    fn test_full_scenario_fare() {
        let mut draft = ferry_draft(2);
        draft.submit_trip().unwrap();
        assert_eq!(draft.stage, DraftStage::PassengerDetails);
        assert_eq!(draft.roster.len(), 2);

        draft.update_passenger(1, PassengerField::Name, "Ahmed").unwrap();
        draft.update_passenger(1, PassengerField::Passport, "P111").unwrap();
        draft.update_passenger(1, PassengerField::Email, "ahmed@example.com").unwrap();
        draft.update_passenger(1, PassengerField::Phone, "7771234").unwrap();
        draft.update_passenger(2, PassengerField::Name, "Mariyam").unwrap();
        draft.update_passenger(2, PassengerField::Passport, "P222").unwrap();
        draft.submit_passengers().unwrap();

        assert_eq!(draft.stage, DraftStage::Payment);
        let fare = draft.fare(&FareCalculator::default());
        assert_eq!(fare.major_units(), 140.0);
        assert_eq!(draft.customer_reference(), "Booking for Male to Dhigurah");
    }

    #[test]
    fn test_passengers_cannot_be_submitted_early() {
        let mut draft = ferry_draft(1);
        assert_eq!(
            draft.submit_passengers(),
            Err(DraftError::StageNotReached {
                required: DraftStage::PassengerDetails
            })
        );
    }

    #[test]
    fn test_activity_rejects_ferry_setters() {
        let mut draft = BookingDraft::new(BookingFormat::Activity);
        assert_eq!(
            draft.set_from("Male"),
            Err(DraftError::WrongKind {
                expected: BookingFormat::Ferry
            })
        );
        draft
            .set_activity(
                "Whale shark snorkelling",
                Some(Utc::now().date_naive()),
                Some("09:00".to_string()),
            )
            .unwrap();
        draft
            .handle_passenger_count_change(PassengerCategory::Adults, 10)
            .unwrap();
        draft
            .handle_passenger_count_change(PassengerCategory::Seniors, 1)
            .unwrap();
        assert_eq!(
            draft.submit_trip(),
            Err(DraftError::TooManyPassengers { max: 10 })
        );
    }

    #[test]
    fn test_oversized_category_count_is_rejected() {
        let mut draft = ferry_draft(2);
        assert_eq!(
            draft.handle_passenger_count_change(PassengerCategory::Adults, u32::MAX),
            Err(DraftError::TooManyPassengers { max: 15 })
        );
        assert_eq!(
            draft.handle_passenger_count_change(PassengerCategory::Children, 16),
            Err(DraftError::TooManyPassengers { max: 15 })
        );
        assert_eq!(draft.passenger_counts.adults, 2);
        assert_eq!(draft.passenger_counts.children, 0);
        assert_eq!(draft.seats, 2);

        draft
            .handle_passenger_count_change(PassengerCategory::Adults, 15)
            .unwrap();
        draft
            .handle_passenger_count_change(PassengerCategory::Seniors, 15)
            .unwrap();
        assert_eq!(draft.seats, 30);
        assert_eq!(
            draft.submit_trip(),
            Err(DraftError::TooManyPassengers { max: 15 })
        );
    }

    #[test]
    fn test_counts_total_saturates() {
        let counts = PassengerCounts {
            adults: u32::MAX,
            children: 1,
            seniors: 1,
        };
        assert_eq!(counts.total(), u32::MAX);
    }

    #[test]
    fn test_edit_after_payment_started_drops_stale_attempt() {
        let mut draft = ferry_draft(2);
        draft.stage = DraftStage::Payment;
        draft.booking_id = Some(Uuid::new_v4());
        draft.payment.transaction_id = Some("txn_1".to_string());

        draft
            .handle_passenger_count_change(PassengerCategory::Adults, 1)
            .unwrap();
        assert_eq!(draft.stage, DraftStage::SelectTrip);
        assert_eq!(draft.booking_id, None);
        assert!(draft.payment.transaction_id.is_none());

        draft.stage = DraftStage::Payment;
        draft.booking_id = Some(Uuid::new_v4());
        draft.set_time(Some(TimeSlot::Evening)).unwrap();
        assert_eq!(draft.booking_id, None);
    }

    #[test]
    fn test_paid_draft_keeps_booking_id() {
        let mut draft = ferry_draft(2);
        let booking_id = Uuid::new_v4();
        draft.stage = DraftStage::Payment;
        draft.booking_id = Some(booking_id);
        draft.payment_complete = true;

        draft
            .handle_passenger_count_change(PassengerCategory::Adults, 1)
            .unwrap();
        assert_eq!(draft.booking_id, Some(booking_id));
    }

    #[test]
    fn test_fare_uses_seats_before_roster() {
        let draft = ferry_draft(3);
        let fare = draft.fare(&FareCalculator::default());
        assert_eq!(fare.passenger_count, 3);
    }
}
