use atoll_catalog::pricing::Fare;
use atoll_core::booking::PaymentReference;
use atoll_core::payment::{CreatePaymentRequest, PaymentGateway};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::models::{BookingDraft, DraftStage, PaymentState};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Payment amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Payment gateway did not return a transaction id")]
    MissingTransactionId,

    #[error("Payment gateway did not return a redirect URL")]
    MissingRedirectUrl,

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("No payment is pending for this draft")]
    NoPendingTransaction,

    #[error("Passenger details must be submitted before payment")]
    StageNotReached,

    #[error("Draft is already paid")]
    AlreadyPaid,
}

impl PaymentError {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::NonPositiveAmount => "non_positive_amount",
            PaymentError::MissingTransactionId => "missing_transaction_id",
            PaymentError::MissingRedirectUrl => "missing_redirect_url",
            PaymentError::Gateway(_) => "payment_gateway_error",
            PaymentError::NoPendingTransaction => "no_pending_transaction",
            PaymentError::StageNotReached => "stage_not_reached",
            PaymentError::AlreadyPaid => "already_paid",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRedirect {
    pub transaction_id: String,
    pub url: String,
    pub payment_reference: PaymentReference,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum VerificationOutcome {
    Confirmed { gateway_reference: Option<String> },
    Failed { status: String },
}

/// Drives a draft through `Idle -> Creating -> Redirected -> Verifying -> Confirmed|Failed`.
pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    sign_method: String,
}

impl PaymentOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGateway>, sign_method: impl Into<String>) -> Self {
        Self {
            gateway,
            sign_method: sign_method.into(),
        }
    }

    fn fail(draft: &mut BookingDraft, error: PaymentError) -> PaymentError {
        draft.payment.state = PaymentState::Failed;
        draft.payment.failure = Some(error.to_string());
        draft.touch();
        error
    }

    /// Start (or restart after a failure) a hosted transaction for the draft.
    ///
    /// The payment reference is generated once and reused on every retry.
    pub async fn initiate(
        &self,
        draft: &mut BookingDraft,
        fare: &Fare,
        access_token: Option<&str>,
    ) -> Result<PaymentRedirect, PaymentError> {
        if draft.payment_complete || draft.stage == DraftStage::Confirmed {
            return Err(PaymentError::AlreadyPaid);
        }
        if draft.stage < DraftStage::Payment {
            return Err(PaymentError::StageNotReached);
        }
        if fare.amount_cents <= 0 {
            return Err(PaymentError::NonPositiveAmount);
        }

        let reference = draft
            .payment_reference
            .get_or_insert_with(PaymentReference::generate)
            .clone();
        draft.payment.state = PaymentState::Creating;
        draft.payment.failure = None;

        let booking = match serde_json::to_value(&*draft) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let request = CreatePaymentRequest {
            amount_cents: fare.amount_cents,
            currency: fare.currency.clone(),
            sign_method: self.sign_method.clone(),
            payment_reference: reference.to_string(),
            customer_reference: draft.customer_reference(),
            booking,
        };

        let response = match self.gateway.create_transaction(&request, access_token).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Payment creation failed for draft {}: {}", draft.id, e);
                return Err(Self::fail(draft, PaymentError::Gateway(e.to_string())));
            }
        };

        let Some(transaction_id) = response.id.filter(|id| !id.is_empty()) else {
            return Err(Self::fail(draft, PaymentError::MissingTransactionId));
        };
        let Some(url) = response.url.filter(|url| !url.is_empty()) else {
            return Err(Self::fail(draft, PaymentError::MissingRedirectUrl));
        };

        draft.payment.state = PaymentState::Redirected;
        draft.payment.transaction_id = Some(transaction_id.clone());
        draft.payment.redirect_url = Some(url.clone());
        draft.touch();
        tracing::info!(
            "Payment {} created for draft {} ({} cents)",
            reference,
            draft.id,
            fare.amount_cents
        );

        Ok(PaymentRedirect {
            transaction_id,
            url,
            payment_reference: reference,
            amount_cents: fare.amount_cents,
        })
    }

    /// Check the cached transaction after the customer returns from the gateway.
    pub async fn verify(
        &self,
        draft: &mut BookingDraft,
        access_token: Option<&str>,
    ) -> Result<VerificationOutcome, PaymentError> {
        if draft.payment_complete {
            return Ok(VerificationOutcome::Confirmed {
                gateway_reference: draft.payment.gateway_reference.clone(),
            });
        }
        let transaction_id = draft
            .payment
            .transaction_id
            .clone()
            .ok_or(PaymentError::NoPendingTransaction)?;

        draft.payment.state = PaymentState::Verifying;
        let response = match self
            .gateway
            .verify_transaction(&transaction_id, access_token)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Payment verification failed for {}: {}", transaction_id, e);
                return Err(Self::fail(draft, PaymentError::Gateway(e.to_string())));
            }
        };

        if response.is_confirmed() {
            draft.payment.state = PaymentState::Confirmed;
            draft.payment.gateway_reference = response.booking_reference.clone();
            draft.payment.failure = None;
            draft.payment_complete = true;
            draft.touch();
            return Ok(VerificationOutcome::Confirmed {
                gateway_reference: response.booking_reference,
            });
        }

        let status = response.normalized_status();
        tracing::warn!("Payment {} not confirmed: {:?}", transaction_id, status);
        Self::fail(draft, PaymentError::Gateway(format!("status {status}")));
        Ok(VerificationOutcome::Failed { status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPaymentGateway;
    use crate::testing::payment_ready_draft;
    use atoll_catalog::pricing::FareCalculator;

    fn orchestrator(gateway: Arc<MockPaymentGateway>) -> PaymentOrchestrator {
        PaymentOrchestrator::new(gateway, "sha1")
    }

    #[tokio::test]
    async fn test_initiate_builds_request_and_redirects() {
        let gateway = Arc::new(MockPaymentGateway::new());
        let orchestrator = orchestrator(gateway.clone());
        let mut draft = payment_ready_draft();
        let fare = draft.fare(&FareCalculator::default());

        let redirect = orchestrator.initiate(&mut draft, &fare, None).await.unwrap();

        assert_eq!(redirect.amount_cents, 14000);
        assert!(redirect.url.starts_with("https://"));
        assert_eq!(draft.payment.state, PaymentState::Redirected);
        assert_eq!(draft.payment.transaction_id, Some(redirect.transaction_id));

        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].currency, "USD");
        assert_eq!(requests[0].sign_method, "sha1");
        assert_eq!(requests[0].customer_reference, "Booking for Male to Dhigurah");
        assert!(requests[0].payment_reference.starts_with("RTM-"));
        assert!(requests[0].booking.contains_key("roster"));
    }

    #[tokio::test]
    async fn test_missing_url_leaves_draft_unpaid() {
        let orchestrator = orchestrator(Arc::new(MockPaymentGateway::without_redirect()));
        let mut draft = payment_ready_draft();
        let fare = draft.fare(&FareCalculator::default());

        let err = orchestrator.initiate(&mut draft, &fare, None).await.unwrap_err();
        assert_eq!(err, PaymentError::MissingRedirectUrl);
        assert!(!draft.payment_complete);
        assert_eq!(draft.payment.state, PaymentState::Failed);
        assert!(draft.payment.redirect_url.is_none());
    }

    #[tokio::test]
    async fn test_zero_amount_is_rejected() {
        let orchestrator = orchestrator(Arc::new(MockPaymentGateway::new()));
        let mut draft = payment_ready_draft();
        let fare = FareCalculator::default().total(0, false);

        let err = orchestrator.initiate(&mut draft, &fare, None).await.unwrap_err();
        assert_eq!(err, PaymentError::NonPositiveAmount);
        assert!(draft.payment_reference.is_none());
    }

    #[tokio::test]
    async fn test_reference_survives_retry() {
        let orchestrator = orchestrator(Arc::new(MockPaymentGateway::new()));
        let mut draft = payment_ready_draft();
        let fare = draft.fare(&FareCalculator::default());

        let first = orchestrator.initiate(&mut draft, &fare, None).await.unwrap();
        let second = orchestrator.initiate(&mut draft, &fare, None).await.unwrap();
        assert_eq!(first.payment_reference, second.payment_reference);
    }

    #[tokio::test]
    async fn test_verify_confirms_case_insensitively() {
        let gateway = Arc::new(MockPaymentGateway::new());
        let orchestrator = orchestrator(gateway.clone());
        let mut draft = payment_ready_draft();
        let fare = draft.fare(&FareCalculator::default());
        orchestrator.initiate(&mut draft, &fare, None).await.unwrap();

        let outcome = orchestrator.verify(&mut draft, None).await.unwrap();
        assert!(matches!(outcome, VerificationOutcome::Confirmed { .. }));
        assert!(draft.payment_complete);
        assert_eq!(draft.payment.state, PaymentState::Confirmed);
    }

    #[tokio::test]
    async fn test_verify_failure_allows_retry() {
        let gateway = Arc::new(MockPaymentGateway::new());
        gateway.set_status("DECLINED");
        let orchestrator = orchestrator(gateway.clone());
        let mut draft = payment_ready_draft();
        let fare = draft.fare(&FareCalculator::default());
        orchestrator.initiate(&mut draft, &fare, None).await.unwrap();

        let outcome = orchestrator.verify(&mut draft, None).await.unwrap();
        assert_eq!(
            outcome,
            VerificationOutcome::Failed {
                status: "DECLINED".to_string()
            }
        );
        assert!(!draft.payment_complete);

        gateway.set_status("confirmed");
        orchestrator.initiate(&mut draft, &fare, None).await.unwrap();
        let outcome = orchestrator.verify(&mut draft, None).await.unwrap();
        assert!(matches!(outcome, VerificationOutcome::Confirmed { .. }));
    }

    #[tokio::test]
    async fn test_verify_without_transaction() {
        let orchestrator = orchestrator(Arc::new(MockPaymentGateway::new()));
        let mut draft = payment_ready_draft();
        assert_eq!(
            orchestrator.verify(&mut draft, None).await.unwrap_err(),
            PaymentError::NoPendingTransaction
        );
    }
}
