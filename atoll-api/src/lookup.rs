use atoll_core::booking::BookingRecord;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/lookup/code", post(request_code))
        .route("/v1/lookup/verify", post(verify_code))
}

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
    pub reference: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub bookings: Vec<BookingRecord>,
}

/// POST /v1/lookup/code
async fn request_code(
    State(state): State<AppState>,
    Json(req): Json<CodeRequest>,
) -> Result<StatusCode, AppError> {
    state.lookup.request_code(&req.email).await?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /v1/lookup/verify
async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<LookupResponse>, AppError> {
    let bookings = state
        .lookup
        .verify(&req.email, &req.code, req.reference.as_deref())
        .await?;
    tracing::debug!("Lookup returned {} bookings", bookings.len());
    Ok(Json(LookupResponse { bookings }))
}
