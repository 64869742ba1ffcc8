use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

pub const GUEST_ROLE: &str = "GUEST";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GuestClaims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// A validated caller. The guest token itself never leaves this service.
#[derive(Debug, Clone)]
pub struct Session {
    pub claims: GuestClaims,
}

/// Anonymous requests pass through; a bearer token, when present, must be valid.
pub async fn session_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(TypedHeader(Authorization(bearer))) = bearer {
        let token_data = decode::<GuestClaims>(
            bearer.token(),
            &DecodingKey::from_secret(state.auth.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Authentication(format!("Invalid session token: {}", e)))?;

        if token_data.claims.role != GUEST_ROLE {
            return Err(AppError::Authorization("Unsupported session role".to_string()));
        }
        req.extensions_mut().insert(Session {
            claims: token_data.claims,
        });
    }

    Ok(next.run(req).await)
}
