use std::convert::Infallible;

use atoll_catalog::directory::DirectorySnapshot;
use atoll_core::timeslot::TimeSlot;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::WatchStream;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/routes", get(list_routes))
        .route("/v1/routes/timings", get(get_timings))
        .route("/v1/routes/destinations", get(get_destinations))
        .route("/v1/routes/stream", get(stream_routes))
}

#[derive(Debug, Deserialize)]
pub struct TimingsQuery {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct TimingsResponse {
    pub from: String,
    pub to: String,
    pub timings: Vec<TimeSlot>,
}

#[derive(Debug, Deserialize)]
pub struct DestinationsQuery {
    pub from: String,
}

/// GET /v1/routes
async fn list_routes(State(state): State<AppState>) -> Json<DirectorySnapshot> {
    Json(state.directory.snapshot().as_ref().clone())
}

/// GET /v1/routes/timings?from&to
/// Never fails: unknown pairs get every time slot.
async fn get_timings(
    State(state): State<AppState>,
    Query(query): Query<TimingsQuery>,
) -> Json<TimingsResponse> {
    let timings = state.directory.timings(&query.from, &query.to);
    Json(TimingsResponse {
        from: query.from,
        to: query.to,
        timings,
    })
}

/// GET /v1/routes/destinations?from
async fn get_destinations(
    State(state): State<AppState>,
    Query(query): Query<DestinationsQuery>,
) -> Json<Vec<String>> {
    Json(state.directory.destinations_from(&query.from))
}

/// GET /v1/routes/stream
/// Current snapshot first, then a new one after every refresh.
async fn stream_routes(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = WatchStream::new(state.directory.subscribe()).filter_map(|snapshot| async move {
        match Event::default().event("routes").json_data(snapshot.as_ref()) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::error!("Failed to encode routes snapshot: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
