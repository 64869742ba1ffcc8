use axum::{
    extract::{ConnectInfo, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod drafts;
pub mod error;
pub mod lookup;
pub mod metrics;
pub mod middleware;
pub mod payments;
pub mod routes;
pub mod saved;
pub mod state;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
            axum::http::HeaderName::from_static(payments::PLATFORM_TOKEN_HEADER),
        ]);

    Router::new()
        .merge(auth::routes())
        .merge(routes::routes())
        .merge(drafts::routes())
        .merge(payments::routes())
        .merge(saved::routes())
        .merge(lookup::routes())
        .route("/metrics", get(metrics::metrics_handler))
        .route("/health", get(health))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::resiliency::circuit_breaker_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "routes": state.directory.snapshot().routes.len(),
    }))
}

/// Per-IP fixed window. Skipped without Redis or a peer address; fails open on Redis errors.
async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let (Some(limiter), Some(ConnectInfo(addr))) = (
        state.rate_limiter.as_ref(),
        req.extensions().get::<ConnectInfo<SocketAddr>>().copied(),
    ) else {
        return next.run(req).await;
    };

    let key = format!("ratelimit:{}", addr.ip());
    match limiter
        .check_rate_limit(&key, state.rate_limit_per_minute, 60)
        .await
    {
        Ok(false) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Rate limit exceeded", "code": "rate_limited" })),
        )
            .into_response(),
        Ok(true) => next.run(req).await,
        Err(e) => {
            tracing::warn!("Rate limiter unavailable: {}", e);
            next.run(req).await
        }
    }
}
