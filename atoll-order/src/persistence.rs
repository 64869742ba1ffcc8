use atoll_core::booking::{BookingRecord, NewBooking, PaymentReference};
use atoll_core::repository::BookingRepository;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{BookingDraft, DraftKind};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Draft was already saved as booking {0}")]
    AlreadyPersisted(Uuid),

    #[error("Booking storage error: {0}")]
    Storage(String),
}

/// Flatten a draft into the bookings-table shape. A missing departure date becomes `today`.
pub fn to_new_booking(draft: &BookingDraft, today: NaiveDate) -> NewBooking {
    let primary = draft.primary_passenger();
    let mut booking = NewBooking {
        user_email: primary.email.expose().trim().to_string(),
        from_location: None,
        to_location: None,
        departure_time: None,
        departure_date: today,
        return_trip: false,
        return_from_location: None,
        return_to_location: None,
        return_time: None,
        return_date: None,
        passenger_count: draft.passenger_count() as i32,
        payment_complete: draft.payment_complete,
        payment_reference: draft.payment_reference.as_ref().map(|r| r.to_string()),
        passenger_info: draft.roster.passengers().to_vec(),
        activity: None,
        is_activity_booking: false,
    };

    match &draft.kind {
        DraftKind::Ferry(trip) => {
            booking.from_location = Some(trip.from.clone());
            booking.to_location = Some(trip.to.clone());
            booking.departure_time = trip.time.map(|t| t.label().to_string());
            booking.departure_date = trip.date.unwrap_or(today);
            if let (true, Some(details)) = (trip.return_trip, &trip.return_details) {
                booking.return_trip = true;
                booking.return_from_location = Some(details.from.clone());
                booking.return_to_location = Some(details.to.clone());
                booking.return_time = details.time.map(|t| t.label().to_string());
                booking.return_date = details.date;
            }
        }
        DraftKind::Activity(selection) => {
            booking.departure_date = selection.date.unwrap_or(today);
            booking.departure_time = selection.time.clone();
            booking.activity = Some(selection.activity.clone());
            booking.is_activity_booking = true;
        }
    }
    booking
}

pub struct BookingPersister {
    bookings: Arc<dyn BookingRepository>,
}

impl BookingPersister {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Insert the booking row for a draft and remember its id on the draft.
    pub async fn persist(&self, draft: &mut BookingDraft) -> Result<BookingRecord, PersistError> {
        if let Some(id) = draft.booking_id {
            return Err(PersistError::AlreadyPersisted(id));
        }
        if draft.payment_complete && draft.payment_reference.is_none() {
            draft.payment_reference = Some(PaymentReference::generate());
        }

        let today = chrono::Utc::now().date_naive();
        let row = to_new_booking(draft, today);
        let record = self.bookings.insert_booking(&row).await.map_err(|e| {
            tracing::error!("Failed to insert booking for draft {}: {}", draft.id, e);
            PersistError::Storage(e.to_string())
        })?;

        draft.booking_id = Some(record.id);
        draft.touch();
        tracing::info!(
            "Booking {} saved (reference {:?}, paid: {})",
            record.id,
            record.booking.payment_reference,
            record.booking.payment_complete
        );
        Ok(record)
    }

    /// Flip `payment_complete` on the row `persist` inserted before payment.
    pub async fn complete_payment(
        &self,
        booking_id: Uuid,
        reference: &PaymentReference,
    ) -> Result<bool, PersistError> {
        let updated = self
            .bookings
            .mark_paid(booking_id, reference)
            .await
            .map_err(|e| {
                tracing::error!("Failed to mark booking {} as paid: {}", booking_id, e);
                PersistError::Storage(e.to_string())
            })?;
        if !updated {
            tracing::warn!("Booking {} with reference {} not found", booking_id, reference);
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingFormat, PassengerCategory};
    use crate::testing::{payment_ready_draft, travel_date};
    use atoll_store::memory::InMemoryBookingRepository;

    #[test]
    fn test_ferry_draft_flattens() {
        let mut draft = payment_ready_draft();
        draft.set_return_trip(true).unwrap();
        let row = to_new_booking(&draft, travel_date());

        assert_eq!(row.from_location.as_deref(), Some("Male"));
        assert_eq!(row.to_location.as_deref(), Some("Dhigurah"));
        assert_eq!(row.departure_time.as_deref(), Some("Morning"));
        assert_eq!(row.user_email, "ahmed@example.com");
        assert_eq!(row.passenger_info.len(), 2);
        assert!(row.return_trip);
        assert_eq!(row.return_from_location.as_deref(), Some("Dhigurah"));
        assert!(!row.is_activity_booking);
    }

    #[test]
    fn test_missing_date_defaults_to_today() {
        let mut draft = BookingDraft::new(BookingFormat::Activity);
        draft.set_activity("Sandbank picnic", None, None).unwrap();
        draft
            .handle_passenger_count_change(PassengerCategory::Adults, 3)
            .unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let row = to_new_booking(&draft, today);
        assert_eq!(row.departure_date, today);
        assert_eq!(row.activity.as_deref(), Some("Sandbank picnic"));
        assert!(row.is_activity_booking);
        assert_eq!(row.passenger_count, 3);
    }

    #[tokio::test]
    async fn test_persist_assigns_reference_when_paid() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let persister = BookingPersister::new(repo.clone());
        let mut draft = payment_ready_draft();
        draft.payment_complete = true;

        let record = persister.persist(&mut draft).await.unwrap();
        assert!(record.booking.payment_complete);
        assert!(draft.payment_reference.is_some());
        assert_eq!(draft.booking_id, Some(record.id));

        let err = persister.persist(&mut draft).await.unwrap_err();
        assert!(matches!(err, PersistError::AlreadyPersisted(id) if id == record.id));
    }

    #[tokio::test]
    async fn test_complete_payment_updates_row() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let persister = BookingPersister::new(repo.clone());
        let mut draft = payment_ready_draft();
        let reference = PaymentReference::generate();
        draft.payment_reference = Some(reference.clone());

        let record = persister.persist(&mut draft).await.unwrap();
        assert!(persister.complete_payment(record.id, &reference).await.unwrap());

        let rows = repo
            .find_by_reference_and_email(&reference, "ahmed@example.com")
            .await
            .unwrap();
        assert!(rows[0].booking.payment_complete);
        assert!(!persister
            .complete_payment(record.id, &PaymentReference::parse("RTM-0000").unwrap())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_complete_payment_leaves_other_rows_with_same_reference() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let persister = BookingPersister::new(repo.clone());
        let reference = PaymentReference::parse("RTM-4242").unwrap();

        let mut mine = payment_ready_draft();
        mine.payment_reference = Some(reference.clone());
        let record = persister.persist(&mut mine).await.unwrap();

        let mut theirs = payment_ready_draft();
        theirs.payment_reference = Some(reference.clone());
        theirs
            .update_passenger(1, crate::PassengerField::Email, "other@example.com")
            .unwrap();
        persister.persist(&mut theirs).await.unwrap();

        assert!(persister.complete_payment(record.id, &reference).await.unwrap());
        let other = repo
            .find_by_reference_and_email(&reference, "other@example.com")
            .await
            .unwrap();
        assert!(!other[0].booking.payment_complete);
    }
}
