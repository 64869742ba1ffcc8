use axum::{extract::State, http::header, response::IntoResponse};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

pub struct Metrics {
    registry: Registry,
    pub drafts_created: IntCounter,
    pub payments: IntCounterVec,
    pub bookings_confirmed: IntCounter,
    pub emails: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let drafts_created = IntCounter::new("atoll_drafts_created_total", "Booking drafts created")?;
        let payments = IntCounterVec::new(
            Opts::new("atoll_payments_total", "Payment attempts by stage and outcome"),
            &["stage", "outcome"],
        )?;
        let bookings_confirmed =
            IntCounter::new("atoll_bookings_confirmed_total", "Bookings confirmed after payment")?;
        let emails = IntCounterVec::new(
            Opts::new("atoll_confirmation_emails_total", "Confirmation emails by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(drafts_created.clone()))?;
        registry.register(Box::new(payments.clone()))?;
        registry.register(Box::new(bookings_confirmed.clone()))?;
        registry.register(Box::new(emails.clone()))?;

        Ok(Self {
            registry,
            drafts_created,
            payments,
            bookings_confirmed,
            emails,
        })
    }

    pub fn payment(&self, stage: &str, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        self.payments.with_label_values(&[stage, outcome]).inc();
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::InternalServerError(format!("Metrics encoding failed: {}", e)))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
