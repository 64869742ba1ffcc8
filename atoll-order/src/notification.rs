use atoll_core::notification::{BookingDetails, ConfirmationEmail, ConfirmationMailer};
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};

use crate::models::{BookingDraft, DraftKind};

const MAX_LOCAL_PART: usize = 64;
const MAX_DOMAIN: usize = 255;
const MAX_EMAIL: usize = 320;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Email address is empty")]
    Empty,
    #[error("Email address is too long")]
    TooLong,
    #[error("Email local part is too long")]
    LocalPartTooLong,
    #[error("Email domain is too long")]
    DomainTooLong,
    #[error("Email address is not valid")]
    Malformed,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
        )
        .expect("email pattern is valid")
    })
}

pub fn validate_email(email: &str) -> Result<(), EmailError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(EmailError::Empty);
    }
    if email.len() > MAX_EMAIL {
        return Err(EmailError::TooLong);
    }
    let (local, domain) = email.rsplit_once('@').ok_or(EmailError::Malformed)?;
    if local.len() > MAX_LOCAL_PART {
        return Err(EmailError::LocalPartTooLong);
    }
    if domain.len() > MAX_DOMAIN {
        return Err(EmailError::DomainTooLong);
    }
    if !email_pattern().is_match(email) {
        return Err(EmailError::Malformed);
    }
    Ok(())
}

/// Result of a confirmation attempt. Failures are reported, never raised.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotifyOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub email_sent_to: Option<String>,
}

pub struct Notifier {
    mailer: Arc<dyn ConfirmationMailer>,
    origin: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn ConfirmationMailer>, origin: impl Into<String>) -> Self {
        Self {
            mailer,
            origin: origin.into(),
        }
    }

    pub fn build_email(&self, draft: &BookingDraft) -> ConfirmationEmail {
        let primary = draft.primary_passenger();
        let mut details = BookingDetails {
            passenger_count: draft.passenger_count(),
            payment_reference: draft.payment_reference.as_ref().map(|r| r.to_string()),
            origin: self.origin.clone(),
            ..Default::default()
        };

        match &draft.kind {
            DraftKind::Ferry(trip) => {
                details.from = Some(trip.from.clone());
                details.to = Some(trip.to.clone());
                details.date = trip.date.map(|d| d.to_string());
                details.time = trip.time.map(|t| t.label().to_string());
                details.outbound_speedboat_name = trip.outbound_speedboat.clone();
                if let (true, Some(ret)) = (trip.return_trip, &trip.return_details) {
                    details.return_trip = true;
                    details.return_date = ret.date.map(|d| d.to_string());
                    details.return_time = ret.time.map(|t| t.label().to_string());
                    details.return_speedboat_name = trip.return_speedboat.clone();
                }
            }
            DraftKind::Activity(selection) => {
                details.is_activity_booking = true;
                details.activity = Some(selection.activity.clone());
                details.activity_date = selection.date.map(|d| d.to_string());
                details.activity_time = selection.time.clone();
            }
        }

        ConfirmationEmail {
            email: primary.email.expose().trim().to_string(),
            name: primary.name.clone(),
            booking_details: details,
        }
    }

    pub async fn notify(&self, draft: &BookingDraft) -> NotifyOutcome {
        let email = self.build_email(draft);
        if let Err(e) = validate_email(&email.email) {
            tracing::warn!("Skipping confirmation email for draft {}: {}", draft.id, e);
            return NotifyOutcome {
                success: false,
                error: Some(e.to_string()),
                email_sent_to: None,
            };
        }

        match self.mailer.send_confirmation(&email).await {
            Ok(()) => {
                tracing::info!(
                    "Confirmation email sent to {}",
                    atoll_shared::pii::mask_email(&email.email)
                );
                NotifyOutcome {
                    success: true,
                    error: None,
                    email_sent_to: Some(email.email),
                }
            }
            Err(e) => {
                tracing::warn!("Confirmation email failed for draft {}: {}", draft.id, e);
                NotifyOutcome {
                    success: false,
                    error: Some(e.to_string()),
                    email_sent_to: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingMailer;
    use crate::testing::payment_ready_draft;

    #[test]
    fn test_email_validation() {
        assert_eq!(validate_email(""), Err(EmailError::Empty));
        assert_eq!(validate_email("no-at-sign.com"), Err(EmailError::Malformed));
        assert_eq!(
            validate_email(&format!("{}@example.com", "a".repeat(65))),
            Err(EmailError::LocalPartTooLong)
        );
        let long_domain = format!("{}com", "abcdefghij.".repeat(24));
        assert_eq!(
            validate_email(&format!("a@{long_domain}")),
            Err(EmailError::DomainTooLong)
        );
        assert_eq!(
            validate_email(&format!("{}@{}.com", "a".repeat(60), "b".repeat(300))),
            Err(EmailError::TooLong)
        );
        assert_eq!(validate_email("a@b.co"), Ok(()));
        assert_eq!(validate_email("a@b"), Err(EmailError::Malformed));
    }

    #[tokio::test]
    async fn test_notify_sends_booking_details() {
        let mailer = Arc::new(RecordingMailer::new());
        let notifier = Notifier::new(mailer.clone(), "https://atoll.example");
        let draft = payment_ready_draft();

        let outcome = notifier.notify(&draft).await;
        assert!(outcome.success);
        assert_eq!(outcome.email_sent_to.as_deref(), Some("ahmed@example.com"));

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].name, "Ahmed Naseem");
        assert_eq!(sent[0].booking_details.from.as_deref(), Some("Male"));
        assert_eq!(sent[0].booking_details.passenger_count, 2);
        assert_eq!(sent[0].booking_details.origin, "https://atoll.example");
    }

    #[tokio::test]
    async fn test_mailer_failure_is_reported_not_raised() {
        let notifier = Notifier::new(
            Arc::new(RecordingMailer::failing("provider unavailable")),
            "https://atoll.example",
        );
        let outcome = notifier.notify(&payment_ready_draft()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("provider unavailable"));
    }
}
