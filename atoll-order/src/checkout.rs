use atoll_catalog::pricing::{Fare, FareCalculator};
use atoll_core::booking::PaymentReference;
use atoll_core::events::EventPublisher;
use atoll_shared::models::events::{BookingConfirmedEvent, BOOKING_CONFIRMED_TOPIC};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::manager::{DraftManager, ManagerError};
use crate::models::{BookingDraft, DraftStage};
use crate::notification::{Notifier, NotifyOutcome};
use crate::orchestrator::{PaymentError, PaymentOrchestrator, PaymentRedirect, VerificationOutcome};
use crate::persistence::BookingPersister;

#[derive(Debug, Clone, Default)]
pub struct CheckoutSettings {
    /// Insert the booking row (unpaid) before redirecting to the gateway, then
    /// flip it to paid by payment reference after verification.
    pub persist_before_payment: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Manager(#[from] ManagerError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Payment was not confirmed (status {0:?})")]
    NotConfirmed(String),

    #[error("Booking is already confirmed")]
    AlreadyConfirmed,
}

/// What the confirmation page shows. Persistence and email problems are
/// reported here instead of failing the confirmation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub draft: BookingDraft,
    pub fare: Fare,
    pub booking_id: Option<Uuid>,
    pub payment_reference: Option<PaymentReference>,
    pub gateway_reference: Option<String>,
    pub persist_error: Option<String>,
    pub notification: NotifyOutcome,
}

/// Payment page and confirmation page, wired together.
pub struct Checkout {
    drafts: Arc<DraftManager>,
    fares: FareCalculator,
    orchestrator: PaymentOrchestrator,
    persister: BookingPersister,
    notifier: Notifier,
    events: Option<Arc<dyn EventPublisher>>,
    settings: CheckoutSettings,
}

impl Checkout {
    pub fn new(
        drafts: Arc<DraftManager>,
        fares: FareCalculator,
        orchestrator: PaymentOrchestrator,
        persister: BookingPersister,
        notifier: Notifier,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            drafts,
            fares,
            orchestrator,
            persister,
            notifier,
            events: None,
            settings,
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn fares(&self) -> &FareCalculator {
        &self.fares
    }

    pub async fn begin_payment(
        &self,
        draft_id: Uuid,
        access_token: Option<&str>,
    ) -> Result<PaymentRedirect, CheckoutError> {
        let mut draft = self.drafts.get(draft_id).await?;
        if draft.stage == DraftStage::Confirmed {
            return Err(CheckoutError::AlreadyConfirmed);
        }
        let fare = draft.fare(&self.fares);

        if self.settings.persist_before_payment
            && draft.stage == DraftStage::Payment
            && draft.booking_id.is_none()
            && fare.amount_cents > 0
        {
            draft
                .payment_reference
                .get_or_insert_with(PaymentReference::generate);
            if let Err(e) = self.persister.persist(&mut draft).await {
                tracing::warn!("Pre-payment insert failed for draft {}: {}", draft_id, e);
            }
        }

        let result = self.orchestrator.initiate(&mut draft, &fare, access_token).await;
        // Keep the failure state too, so the payment page can show it.
        self.drafts.save(&draft).await?;
        Ok(result?)
    }

    pub async fn complete_payment(
        &self,
        draft_id: Uuid,
        access_token: Option<&str>,
    ) -> Result<Confirmation, CheckoutError> {
        let mut draft = self.drafts.get(draft_id).await?;
        if draft.stage == DraftStage::Confirmed {
            return Err(CheckoutError::AlreadyConfirmed);
        }

        let verification = self.orchestrator.verify(&mut draft, access_token).await;
        let gateway_reference = match verification {
            Ok(VerificationOutcome::Confirmed { gateway_reference }) => gateway_reference,
            Ok(VerificationOutcome::Failed { status }) => {
                self.drafts.save(&draft).await?;
                return Err(CheckoutError::NotConfirmed(status));
            }
            Err(e) => {
                self.drafts.save(&draft).await?;
                return Err(e.into());
            }
        };

        let persist_error = match (draft.booking_id, draft.payment_reference.clone()) {
            (Some(booking_id), Some(reference)) => {
                match self.persister.complete_payment(booking_id, &reference).await {
                    Ok(true) => None,
                    Ok(false) => Some(format!("Booking {booking_id} ({reference}) not found")),
                    Err(e) => Some(e.to_string()),
                }
            }
            _ => self.persister.persist(&mut draft).await.err().map(|e| e.to_string()),
        };

        // The email goes out even when the insert failed.
        let notification = self.notifier.notify(&draft).await;

        draft.stage = DraftStage::Confirmed;
        draft.touch();
        self.drafts.save(&draft).await?;

        let fare = draft.fare(&self.fares);
        self.publish_confirmed(&draft, &fare).await;

        Ok(Confirmation {
            booking_id: draft.booking_id,
            payment_reference: draft.payment_reference.clone(),
            gateway_reference,
            persist_error,
            notification,
            fare,
            draft,
        })
    }

    async fn publish_confirmed(&self, draft: &BookingDraft, fare: &Fare) {
        let Some(events) = &self.events else {
            return;
        };
        let event = BookingConfirmedEvent {
            draft_id: draft.id,
            booking_id: draft.booking_id,
            payment_reference: draft
                .payment_reference
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_default(),
            is_activity_booking: matches!(draft.format(), crate::models::BookingFormat::Activity),
            passenger_count: fare.passenger_count,
            total_cents: fare.amount_cents,
            currency: fare.currency.clone(),
            timestamp: chrono::Utc::now().timestamp(),
        };

        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to encode booking event: {}", e);
                return;
            }
        };
        if let Err(e) = events
            .publish(BOOKING_CONFIRMED_TOPIC, &draft.id.to_string(), &payload)
            .await
        {
            tracing::warn!("Failed to publish booking confirmation for {}: {}", draft.id, e);
        }
    }
}
