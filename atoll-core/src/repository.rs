use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::booking::{BookingRecord, NewBooking, PaymentReference};
use crate::route::RouteRecord;
use crate::BoxError;

/// Read access to the routes table
#[async_trait]
pub trait RouteRepository: Send + Sync {
    /// All routes, ordered by `display_order`.
    async fn list_routes(&self) -> Result<Vec<RouteRecord>, BoxError>;
}

/// Repository trait for booking rows
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: &NewBooking) -> Result<BookingRecord, BoxError>;

    /// Flip `payment_complete` on row `id`, which must also carry `reference`.
    /// Returns false when no row matched. References are not unique.
    async fn mark_paid(&self, id: Uuid, reference: &PaymentReference) -> Result<bool, BoxError>;

    async fn find_by_email(&self, email: &str) -> Result<Vec<BookingRecord>, BoxError>;

    /// Rows with `reference` owned by `email` (case-insensitive), newest first.
    async fn find_by_reference_and_email(
        &self,
        reference: &PaymentReference,
        email: &str,
    ) -> Result<Vec<BookingRecord>, BoxError>;
}

/// Session storage for in-progress drafts, keyed by draft id.
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn put_draft(&self, id: Uuid, draft: &Value) -> Result<(), BoxError>;

    async fn get_draft(&self, id: Uuid) -> Result<Option<Value>, BoxError>;

    async fn delete_draft(&self, id: Uuid) -> Result<(), BoxError>;
}

/// Per-client "saved bookings" list. Entries carry an `id` field.
#[async_trait]
pub trait SavedBookingStore: Send + Sync {
    /// Push newest-first and keep at most `cap` entries.
    async fn push_saved(&self, client_id: &str, entry: &Value, cap: usize) -> Result<(), BoxError>;

    /// Newest first.
    async fn list_saved(&self, client_id: &str) -> Result<Vec<Value>, BoxError>;

    async fn remove_saved(&self, client_id: &str, entry_id: Uuid) -> Result<bool, BoxError>;
}
