use atoll_core::repository::DraftStore;
use std::sync::Arc;
use uuid::Uuid;

use crate::draft::DraftError;
use crate::models::{BookingDraft, BookingFormat};

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Draft not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("Draft storage error: {0}")]
    Storage(String),

    #[error("Draft {0} could not be decoded: {1}")]
    Corrupt(Uuid, String),
}

/// Loads and stores drafts in the session store, keyed by draft id.
pub struct DraftManager {
    store: Arc<dyn DraftStore>,
}

impl DraftManager {
    pub fn new(store: Arc<dyn DraftStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, format: BookingFormat) -> Result<BookingDraft, ManagerError> {
        let draft = BookingDraft::new(format);
        self.save(&draft).await?;
        tracing::debug!("Created {:?} draft {}", format, draft.id);
        Ok(draft)
    }

    pub async fn get(&self, id: Uuid) -> Result<BookingDraft, ManagerError> {
        let value = self
            .store
            .get_draft(id)
            .await
            .map_err(|e| ManagerError::Storage(e.to_string()))?
            .ok_or(ManagerError::NotFound(id))?;

        serde_json::from_value(value).map_err(|e| ManagerError::Corrupt(id, e.to_string()))
    }

    pub async fn save(&self, draft: &BookingDraft) -> Result<(), ManagerError> {
        let value =
            serde_json::to_value(draft).map_err(|e| ManagerError::Corrupt(draft.id, e.to_string()))?;
        self.store
            .put_draft(draft.id, &value)
            .await
            .map_err(|e| ManagerError::Storage(e.to_string()))
    }

    /// Load, apply `change`, and store the draft only if the change succeeded.
    pub async fn update<T, F>(&self, id: Uuid, change: F) -> Result<(T, BookingDraft), ManagerError>
    where
        F: FnOnce(&mut BookingDraft) -> Result<T, DraftError>,
    {
        let mut draft = self.get(id).await?;
        let result = change(&mut draft)?;
        self.save(&draft).await?;
        Ok((result, draft))
    }

    pub async fn discard(&self, id: Uuid) -> Result<(), ManagerError> {
        self.store
            .delete_draft(id)
            .await
            .map_err(|e| ManagerError::Storage(e.to_string()))
    }
}
