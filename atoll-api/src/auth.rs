use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::{GuestClaims, GUEST_ROLE};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    /// Client id for the saved-bookings endpoints.
    pub client_id: String,
    pub expires_in: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/guest", post(login_guest))
}

pub fn issue_guest_token(secret: &str, expiration: u64) -> Result<(String, GuestClaims), AppError> {
    let claims = GuestClaims {
        sub: format!("guest-{}", Uuid::new_v4()),
        role: GUEST_ROLE.to_owned(),
        exp: (Utc::now() + Duration::seconds(expiration as i64)).timestamp() as usize,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;
    Ok((token, claims))
}

async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let (token, claims) = issue_guest_token(&state.auth.secret, state.auth.expiration)?;
    Ok(Json(AuthResponse {
        token,
        client_id: claims.sub,
        expires_in: state.auth.expiration,
    }))
}
