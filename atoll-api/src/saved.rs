use atoll_order::SavedBooking;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::Session;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/clients/{client}/saved-bookings",
            get(list_saved).post(save_draft),
        )
        .route(
            "/v1/clients/{client}/saved-bookings/{id}",
            delete(remove_saved),
        )
}

#[derive(Debug, Deserialize)]
pub struct SaveDraftRequest {
    pub draft_id: Uuid,
}

/// Saved bookings are private to the guest session that created them.
fn authorize(session: Option<Extension<Session>>, client: &str) -> Result<(), AppError> {
    let Some(Extension(session)) = session else {
        return Err(AppError::Authentication("Missing session token".to_string()));
    };
    if session.claims.sub != client {
        return Err(AppError::Authorization(
            "Session does not own these saved bookings".to_string(),
        ));
    }
    Ok(())
}

/// POST /v1/clients/{client}/saved-bookings
async fn save_draft(
    State(state): State<AppState>,
    Path(client): Path<String>,
    session: Option<Extension<Session>>,
    Json(req): Json<SaveDraftRequest>,
) -> Result<(StatusCode, Json<SavedBooking>), AppError> {
    authorize(session, &client)?;
    let draft = state.drafts.get(req.draft_id).await?;
    let entry = state.saved.save(&client, &draft).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /v1/clients/{client}/saved-bookings
async fn list_saved(
    State(state): State<AppState>,
    Path(client): Path<String>,
    session: Option<Extension<Session>>,
) -> Result<Json<Vec<SavedBooking>>, AppError> {
    authorize(session, &client)?;
    Ok(Json(state.saved.list(&client).await?))
}

/// DELETE /v1/clients/{client}/saved-bookings/{id}
async fn remove_saved(
    State(state): State<AppState>,
    Path((client, id)): Path<(String, Uuid)>,
    session: Option<Extension<Session>>,
) -> Result<StatusCode, AppError> {
    authorize(session, &client)?;
    if !state.saved.remove(&client, id).await? {
        return Err(AppError::NotFound {
            code: "saved_booking_not_found",
            message: format!("Saved booking {} not found", id),
        });
    }
    Ok(StatusCode::NO_CONTENT)
}
