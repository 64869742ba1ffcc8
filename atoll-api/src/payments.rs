use atoll_order::{Confirmation, PaymentRedirect};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Platform access token a client may pass through to the hosted functions.
/// Without it the functions are called with the anon key.
pub const PLATFORM_TOKEN_HEADER: &str = "x-platform-token";

fn platform_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(PLATFORM_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/drafts/{id}/payment", post(create_payment))
        .route("/v1/drafts/{id}/payment/verify", post(verify_payment))
}

/// POST /v1/drafts/{id}/payment
///
/// Returns the redirect the client must follow to the bank's payment page.
async fn create_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<PaymentRedirect>, AppError> {
    let result = state.checkout.begin_payment(id, platform_token(&headers)).await;
    state.metrics.payment("create", result.is_ok());

    Ok(Json(result?))
}

/// POST /v1/drafts/{id}/payment/verify
///
/// Called when the client comes back from the bank.
async fn verify_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Confirmation>, AppError> {
    let result = state
        .checkout
        .complete_payment(id, platform_token(&headers))
        .await;
    state.metrics.payment("verify", result.is_ok());

    let confirmation = result?;
    state.metrics.bookings_confirmed.inc();
    let outcome = if confirmation.notification.success { "sent" } else { "failed" };
    state.metrics.emails.with_label_values(&[outcome]).inc();

    if let Some(err) = &confirmation.persist_error {
        tracing::error!("Draft {} confirmed but not stored: {}", id, err);
    }
    Ok(Json(confirmation))
}
