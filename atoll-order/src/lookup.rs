use atoll_core::booking::{BookingRecord, PaymentReference};
use atoll_core::otp::OtpService;
use atoll_core::repository::BookingRepository;
use std::sync::Arc;

use crate::notification::{validate_email, EmailError};

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error(transparent)]
    InvalidEmail(#[from] EmailError),

    #[error("Verification code must be 6 digits")]
    InvalidCode,

    #[error("Verification failed: {0}")]
    Rejected(String),

    #[error("Invalid booking reference: {0}")]
    InvalidReference(String),

    #[error("Lookup service error: {0}")]
    Service(String),
}

/// "Find my booking": email a one-time code, then list that email's bookings.
pub struct BookingLookup {
    otp: Arc<dyn OtpService>,
    bookings: Arc<dyn BookingRepository>,
}

impl BookingLookup {
    pub fn new(otp: Arc<dyn OtpService>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self { otp, bookings }
    }

    pub async fn request_code(&self, email: &str) -> Result<(), LookupError> {
        validate_email(email)?;
        self.otp
            .send_code(email.trim())
            .await
            .map_err(|e| LookupError::Service(e.to_string()))
    }

    /// Bookings for `email` once `code` checks out, narrowed to `reference` when given.
    pub async fn verify(
        &self,
        email: &str,
        code: &str,
        reference: Option<&str>,
    ) -> Result<Vec<BookingRecord>, LookupError> {
        validate_email(email)?;
        let email = email.trim();
        let code = code.trim();
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(LookupError::InvalidCode);
        }

        let validation = self
            .otp
            .validate_code(email, code)
            .await
            .map_err(|e| LookupError::Service(e.to_string()))?;
        if !validation.valid {
            return Err(LookupError::Rejected(
                validation.error.unwrap_or_else(|| "Invalid code".to_string()),
            ));
        }

        let records = match reference {
            Some(raw) => {
                let reference = PaymentReference::parse(raw)
                    .map_err(|_| LookupError::InvalidReference(raw.to_string()))?;
                self.bookings
                    .find_by_reference_and_email(&reference, email)
                    .await
                    .map_err(|e| LookupError::Service(e.to_string()))?
            }
            None => self
                .bookings
                .find_by_email(email)
                .await
                .map_err(|e| LookupError::Service(e.to_string()))?,
        };
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockOtpService;
    use crate::persistence::to_new_booking;
    use crate::testing::{payment_ready_draft, travel_date};
    use atoll_store::memory::InMemoryBookingRepository;

    async fn lookup_with_booking() -> (BookingLookup, String) {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let mut draft = payment_ready_draft();
        let reference = PaymentReference::generate();
        draft.payment_reference = Some(reference.clone());
        repo.insert_booking(&to_new_booking(&draft, travel_date()))
            .await
            .unwrap();
        (
            BookingLookup::new(Arc::new(MockOtpService::default()), repo),
            reference.to_string(),
        )
    }

    #[tokio::test]
    async fn test_lookup_after_code() {
        let (lookup, reference) = lookup_with_booking().await;
        lookup.request_code("ahmed@example.com").await.unwrap();

        let found = lookup.verify("ahmed@example.com", "123456", None).await.unwrap();
        assert_eq!(found.len(), 1);

        let found = lookup
            .verify("ahmed@example.com", "123456", Some(&reference))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_code_is_rejected() {
        let (lookup, _) = lookup_with_booking().await;
        lookup.request_code("ahmed@example.com").await.unwrap();

        assert!(matches!(
            lookup.verify("ahmed@example.com", "654321", None).await,
            Err(LookupError::Rejected(_))
        ));
        assert!(matches!(
            lookup.verify("ahmed@example.com", "12ab56", None).await,
            Err(LookupError::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn test_reference_must_belong_to_email() {
        let (lookup, reference) = lookup_with_booking().await;
        lookup.request_code("someone@example.com").await.unwrap();

        let found = lookup
            .verify("someone@example.com", "123456", Some(&reference))
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
