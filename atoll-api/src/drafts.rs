use atoll_catalog::pricing::Fare;
use atoll_core::timeslot::TimeSlot;
use atoll_order::models::{DraftKind, PassengerCategory};
use atoll_order::{BookingDraft, BookingFormat, DraftError, PassengerField};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/drafts", post(create_draft))
        .route("/v1/drafts/{id}", get(get_draft).delete(discard_draft))
        .route("/v1/drafts/{id}/trip", patch(update_trip))
        .route("/v1/drafts/{id}/passenger-counts", put(update_passenger_counts))
        .route("/v1/drafts/{id}/submit", post(submit_trip))
        .route("/v1/drafts/{id}/passengers", post(add_passenger))
        .route("/v1/drafts/{id}/passengers/submit", post(submit_passengers))
        .route(
            "/v1/drafts/{id}/passengers/{pid}",
            patch(update_passenger).delete(remove_passenger),
        )
        .route("/v1/drafts/{id}/fare", get(get_fare))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateDraftRequest {
    #[serde(default = "default_format")]
    pub format: BookingFormat,
}

fn default_format() -> BookingFormat {
    BookingFormat::Ferry
}

/// Fields left out are not touched.
#[derive(Debug, Default, Deserialize)]
pub struct TripUpdate {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<TimeSlot>,
    pub return_trip: Option<bool>,
    pub return_date: Option<NaiveDate>,
    pub return_time: Option<TimeSlot>,
    pub outbound_speedboat: Option<String>,
    pub return_speedboat: Option<String>,
    pub activity: Option<String>,
    pub activity_date: Option<NaiveDate>,
    pub activity_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PassengerCountsUpdate {
    pub adults: Option<u32>,
    pub children: Option<u32>,
    pub seniors: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PassengerUpdate {
    pub field: PassengerField,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct AddPassengerResponse {
    pub passenger_id: u32,
    pub draft: BookingDraft,
}

#[derive(Debug, Serialize)]
pub struct FareResponse {
    #[serde(flatten)]
    pub fare: Fare,
    /// Major units, e.g. 140.0 for USD 140.00
    pub total: f64,
}

pub fn apply_trip_update(draft: &mut BookingDraft, update: TripUpdate) -> Result<(), DraftError> {
    if let DraftKind::Activity(current) = &draft.kind {
        if update.from.is_some() || update.to.is_some() || update.return_trip.is_some() {
            return Err(DraftError::WrongKind {
                expected: BookingFormat::Ferry,
            });
        }
        let touches_activity = update.activity.is_some()
            || update.activity_date.is_some()
            || update.activity_time.is_some();
        if touches_activity {
            let activity = update.activity.unwrap_or_else(|| current.activity.clone());
            let date = update.activity_date.or(current.date);
            let time = update.activity_time.or_else(|| current.time.clone());
            draft.set_activity(activity, date, time)?;
        }
        return Ok(());
    }

    if update.activity.is_some() {
        return Err(DraftError::WrongKind {
            expected: BookingFormat::Activity,
        });
    }
    if let Some(from) = update.from {
        draft.set_from(from)?;
    }
    if let Some(to) = update.to {
        draft.set_to(to)?;
    }
    if update.date.is_some() {
        draft.set_date(update.date)?;
    }
    if update.time.is_some() {
        draft.set_time(update.time)?;
    }
    if let Some(enabled) = update.return_trip {
        draft.set_return_trip(enabled)?;
    }
    if update.return_date.is_some() {
        draft.set_return_date(update.return_date)?;
    }
    if update.return_time.is_some() {
        draft.set_return_time(update.return_time)?;
    }
    if update.outbound_speedboat.is_some() || update.return_speedboat.is_some() {
        let (outbound, inbound) = match &draft.kind {
            DraftKind::Ferry(trip) => (
                update.outbound_speedboat.or_else(|| trip.outbound_speedboat.clone()),
                update.return_speedboat.or_else(|| trip.return_speedboat.clone()),
            ),
            DraftKind::Activity(_) => (None, None),
        };
        draft.set_speedboats(outbound, inbound)?;
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/drafts
async fn create_draft(
    State(state): State<AppState>,
    Json(req): Json<CreateDraftRequest>,
) -> Result<(StatusCode, Json<BookingDraft>), AppError> {
    let draft = state.drafts.create(req.format).await?;
    state.metrics.drafts_created.inc();
    Ok((StatusCode::CREATED, Json(draft)))
}

/// GET /v1/drafts/{id}
async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDraft>, AppError> {
    Ok(Json(state.drafts.get(id).await?))
}

/// DELETE /v1/drafts/{id}
async fn discard_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.drafts.discard(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /v1/drafts/{id}/trip
async fn update_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<TripUpdate>,
) -> Result<Json<BookingDraft>, AppError> {
    let ((), draft) = state
        .drafts
        .update(id, |draft| apply_trip_update(draft, update))
        .await?;
    Ok(Json(draft))
}

/// PUT /v1/drafts/{id}/passenger-counts
async fn update_passenger_counts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<PassengerCountsUpdate>,
) -> Result<Json<BookingDraft>, AppError> {
    let ((), draft) = state
        .drafts
        .update(id, |draft| {
            let changes = [
                (PassengerCategory::Adults, update.adults),
                (PassengerCategory::Children, update.children),
                (PassengerCategory::Seniors, update.seniors),
            ];
            for (category, value) in changes {
                if let Some(value) = value {
                    draft.handle_passenger_count_change(category, value)?;
                }
            }
            Ok(())
        })
        .await?;
    Ok(Json(draft))
}

/// POST /v1/drafts/{id}/submit
async fn submit_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDraft>, AppError> {
    let ((), draft) = state.drafts.update(id, BookingDraft::submit_trip).await?;
    tracing::debug!("Draft {} moved to passenger details", id);
    Ok(Json(draft))
}

/// POST /v1/drafts/{id}/passengers
async fn add_passenger(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<AddPassengerResponse>), AppError> {
    let (passenger_id, draft) = state.drafts.update(id, BookingDraft::add_passenger).await?;
    Ok((
        StatusCode::CREATED,
        Json(AddPassengerResponse {
            passenger_id,
            draft,
        }),
    ))
}

/// PATCH /v1/drafts/{id}/passengers/{pid}
async fn update_passenger(
    State(state): State<AppState>,
    Path((id, passenger_id)): Path<(Uuid, u32)>,
    Json(req): Json<PassengerUpdate>,
) -> Result<Json<BookingDraft>, AppError> {
    let ((), draft) = state
        .drafts
        .update(id, |draft| draft.update_passenger(passenger_id, req.field, &req.value))
        .await?;
    Ok(Json(draft))
}

/// DELETE /v1/drafts/{id}/passengers/{pid}
async fn remove_passenger(
    State(state): State<AppState>,
    Path((id, passenger_id)): Path<(Uuid, u32)>,
) -> Result<Json<BookingDraft>, AppError> {
    let ((), draft) = state
        .drafts
        .update(id, |draft| draft.remove_passenger(passenger_id))
        .await?;
    Ok(Json(draft))
}

/// POST /v1/drafts/{id}/passengers/submit
async fn submit_passengers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingDraft>, AppError> {
    let ((), draft) = state
        .drafts
        .update(id, BookingDraft::submit_passengers)
        .await?;
    Ok(Json(draft))
}

/// GET /v1/drafts/{id}/fare
async fn get_fare(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FareResponse>, AppError> {
    let draft = state.drafts.get(id).await?;
    let fare = draft.fare(&state.fares);
    Ok(Json(FareResponse {
        total: fare.major_units(),
        fare,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_update_mirrors_return_leg() {
        let mut draft = BookingDraft::new(BookingFormat::Ferry);
        let update = TripUpdate {
            from: Some("Male".into()),
            to: Some("Dhigurah".into()),
            return_trip: Some(true),
            ..Default::default()
        };
        apply_trip_update(&mut draft, update).unwrap();

        let DraftKind::Ferry(trip) = &draft.kind else {
            panic!("expected ferry draft");
        };
        let details = trip.return_details.as_ref().unwrap();
        assert_eq!((details.from.as_str(), details.to.as_str()), ("Dhigurah", "Male"));
    }

    #[test]
    fn test_activity_fields_merge() {
        let mut draft = BookingDraft::new(BookingFormat::Activity);
        apply_trip_update(
            &mut draft,
            TripUpdate {
                activity: Some("Sandbank picnic".into()),
                ..Default::default()
            },
        )
        .unwrap();
        apply_trip_update(
            &mut draft,
            TripUpdate {
                activity_time: Some("10:00".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let DraftKind::Activity(selection) = &draft.kind else {
            panic!("expected activity draft");
        };
        assert_eq!(selection.activity, "Sandbank picnic");
        assert_eq!(selection.time.as_deref(), Some("10:00"));

        let err = apply_trip_update(
            &mut draft,
            TripUpdate {
                from: Some("Male".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            DraftError::WrongKind {
                expected: BookingFormat::Ferry
            }
        );
    }
}
