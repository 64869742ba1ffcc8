use atoll_core::repository::SavedBookingStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::BookingDraft;

#[derive(Debug, thiserror::Error)]
pub enum SavedError {
    #[error("Saved bookings storage error: {0}")]
    Storage(String),
    #[error("Failed to encode saved booking: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A draft snapshot the customer can resume later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedBooking {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub draft: BookingDraft,
}

/// Most-recent-first list of saved drafts per client, capped at `cap` entries.
pub struct SavedBookings {
    store: Arc<dyn SavedBookingStore>,
    cap: usize,
}

impl SavedBookings {
    pub fn new(store: Arc<dyn SavedBookingStore>, cap: usize) -> Self {
        Self {
            store,
            cap: cap.max(1),
        }
    }

    pub async fn save(&self, client_id: &str, draft: &BookingDraft) -> Result<SavedBooking, SavedError> {
        let entry = SavedBooking {
            id: Uuid::new_v4(),
            saved_at: Utc::now(),
            draft: draft.clone(),
        };
        let value = serde_json::to_value(&entry)?;
        self.store
            .push_saved(client_id, &value, self.cap)
            .await
            .map_err(|e| SavedError::Storage(e.to_string()))?;
        Ok(entry)
    }

    /// Entries that no longer decode are skipped.
    pub async fn list(&self, client_id: &str) -> Result<Vec<SavedBooking>, SavedError> {
        let values = self
            .store
            .list_saved(client_id)
            .await
            .map_err(|e| SavedError::Storage(e.to_string()))?;

        Ok(values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<SavedBooking>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Dropping unreadable saved booking for {}: {}", client_id, e);
                    None
                }
            })
            .collect())
    }

    pub async fn remove(&self, client_id: &str, id: Uuid) -> Result<bool, SavedError> {
        self.store
            .remove_saved(client_id, id)
            .await
            .map_err(|e| SavedError::Storage(e.to_string()))
    }
}
