use axum::{
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

pub struct CircuitBreaker {
    pub name: String,
    pub state: RwLock<CircuitState>,
    pub failure_count: AtomicUsize,
    pub failure_threshold: usize,
    pub reset_timeout: Duration,
    pub last_failure: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(name: &str, threshold: usize, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicUsize::new(0),
            failure_threshold: threshold,
            reset_timeout: timeout,
            last_failure: RwLock::new(None),
        }
    }

    /// Whether a request may go through right now.
    pub async fn check(&self) -> bool {
        let state = *self.state.read().await;
        match state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let last_fail = *self.last_failure.read().await;
                match last_fail {
                    Some(instant) if instant.elapsed() > self.reset_timeout => {
                        *self.state.write().await = CircuitState::HalfOpen;
                        tracing::info!("Circuit Breaker [{}] moving to Half-Open", self.name);
                        true
                    }
                    _ => false,
                }
            }
        }
    }

    pub async fn record_success(&self) {
        let mut state = self.state.write().await;
        if *state == CircuitState::HalfOpen {
            tracing::info!("Circuit Breaker [{}] recovered to Closed", self.name);
        }
        *state = CircuitState::Closed;
        self.failure_count.store(0, Ordering::SeqCst);
    }

    pub async fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;

        if count >= self.failure_threshold || *state == CircuitState::HalfOpen {
            *state = CircuitState::Open;
            *self.last_failure.write().await = Some(Instant::now());
            tracing::error!("Circuit Breaker [{}] TRIPPED to Open. Failures: {}", self.name, count);
        }
    }
}

pub struct ResiliencyState {
    pub payment_cb: CircuitBreaker,
}

impl Default for ResiliencyState {
    fn default() -> Self {
        Self {
            payment_cb: CircuitBreaker::new("payment-gateway", 5, Duration::from_secs(30)),
        }
    }
}

fn is_payment_call(method: &Method, path: &str) -> bool {
    method == Method::POST
        && path.starts_with("/v1/drafts/")
        && (path.ends_with("/payment") || path.ends_with("/payment/verify"))
}

/// Fails fast on the payment endpoints after repeated upstream (5xx) failures.
pub async fn circuit_breaker_middleware(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> impl IntoResponse {
    if !is_payment_call(req.method(), req.uri().path()) {
        return next.run(req).await.into_response();
    }

    let cb = &state.resiliency.payment_cb;
    if !cb.check().await {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": format!("Circuit Breaker [{}] is OPEN", cb.name),
                "code": "payment_unavailable",
            })),
        )
            .into_response();
    }

    let response = next.run(req).await;
    if response.status().is_server_error() {
        cb.record_failure().await;
    } else {
        cb.record_success().await;
    }
    response.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trips_after_threshold() {
        let cb = CircuitBreaker::new("test", 2, Duration::from_secs(60));
        assert!(cb.check().await);
        cb.record_failure().await;
        assert!(cb.check().await);
        cb.record_failure().await;
        assert!(!cb.check().await);
    }

    #[tokio::test]
    async fn test_half_open_after_timeout() {
        let cb = CircuitBreaker::new("test", 1, Duration::from_millis(10));
        cb.record_failure().await;
        assert!(!cb.check().await);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cb.check().await);
        cb.record_success().await;
        assert_eq!(*cb.state.read().await, CircuitState::Closed);
    }

    #[test]
    fn test_payment_paths() {
        assert!(is_payment_call(&Method::POST, "/v1/drafts/abc/payment"));
        assert!(is_payment_call(&Method::POST, "/v1/drafts/abc/payment/verify"));
        assert!(!is_payment_call(&Method::GET, "/v1/drafts/abc/payment"));
        assert!(!is_payment_call(&Method::POST, "/v1/drafts/abc/submit"));
    }
}
