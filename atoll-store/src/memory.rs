//! In-process backends for `storage.mode = "memory"` and for tests.

use async_trait::async_trait;
use atoll_core::booking::{BookingRecord, NewBooking, PaymentReference};
use atoll_core::events::EventPublisher;
use atoll_core::repository::{BookingRepository, DraftStore, RouteRepository, SavedBookingStore};
use atoll_core::route::RouteRecord;
use atoll_core::BoxError;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct InMemoryRouteRepository {
    routes: Mutex<Vec<RouteRecord>>,
    failing: Mutex<bool>,
}

impl InMemoryRouteRepository {
    pub fn new(routes: Vec<RouteRecord>) -> Self {
        Self {
            routes: Mutex::new(routes),
            failing: Mutex::new(false),
        }
    }

    pub fn set_routes(&self, routes: Vec<RouteRecord>) {
        *guard(&self.routes) = routes;
    }

    /// Make subsequent `list_routes` calls fail, as an unreachable database would.
    pub fn set_failing(&self, failing: bool) {
        *guard(&self.failing) = failing;
    }
}

/// Starter timetable for memory mode, so the booking form has something to offer.
pub fn sample_routes() -> Vec<RouteRecord> {
    fn route(from: &str, to: &str, minutes: i32, timings: &[&str], order: i32) -> RouteRecord {
        RouteRecord {
            id: Uuid::new_v4(),
            from_location: from.to_string(),
            to_location: to.to_string(),
            price: 70.0,
            duration_minutes: minutes,
            // Unset timings fall back to every slot.
            timings: (!timings.is_empty()).then(|| timings.iter().map(|s| s.to_string()).collect()),
            display_order: order,
        }
    }
    vec![
        route("Male", "Dhigurah", 120, &["Early Morning", "Afternoon"], 1),
        route("Dhigurah", "Male", 120, &["Morning", "Evening"], 2),
        route("Male", "Maamigili", 110, &[], 3),
        route("Maamigili", "Male", 110, &[], 4),
    ]
}

#[async_trait]
impl RouteRepository for InMemoryRouteRepository {
    async fn list_routes(&self) -> Result<Vec<RouteRecord>, BoxError> {
        if *guard(&self.failing) {
            return Err("routes table unavailable".into());
        }
        let mut routes = guard(&self.routes).clone();
        routes.sort_by(|a, b| {
            (a.display_order, &a.from_location, &a.to_location)
                .cmp(&(b.display_order, &b.from_location, &b.to_location))
        });
        Ok(routes)
    }
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    rows: Mutex<Vec<BookingRecord>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        guard(&self.rows).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert_booking(&self, booking: &NewBooking) -> Result<BookingRecord, BoxError> {
        let record = BookingRecord::from_new(booking.clone());
        guard(&self.rows).push(record.clone());
        Ok(record)
    }

    async fn mark_paid(&self, id: Uuid, reference: &PaymentReference) -> Result<bool, BoxError> {
        let mut rows = guard(&self.rows);
        let row = rows.iter_mut().find(|r| {
            r.id == id && r.booking.payment_reference.as_deref() == Some(reference.as_str())
        });
        Ok(match row {
            Some(row) => {
                row.booking.payment_complete = true;
                true
            }
            None => false,
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<BookingRecord>, BoxError> {
        let mut found: Vec<BookingRecord> = guard(&self.rows)
            .iter()
            .filter(|r| r.booking.user_email.eq_ignore_ascii_case(email))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn find_by_reference_and_email(
        &self,
        reference: &PaymentReference,
        email: &str,
    ) -> Result<Vec<BookingRecord>, BoxError> {
        let mut found: Vec<BookingRecord> = guard(&self.rows)
            .iter()
            .filter(|r| {
                r.booking.payment_reference.as_deref() == Some(reference.as_str())
                    && r.booking.user_email.eq_ignore_ascii_case(email)
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

/// Drafts without expiry.
#[derive(Default)]
pub struct InMemoryDraftStore {
    drafts: Mutex<HashMap<Uuid, Value>>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftStore for InMemoryDraftStore {
    async fn put_draft(&self, id: Uuid, draft: &Value) -> Result<(), BoxError> {
        guard(&self.drafts).insert(id, draft.clone());
        Ok(())
    }

    async fn get_draft(&self, id: Uuid) -> Result<Option<Value>, BoxError> {
        Ok(guard(&self.drafts).get(&id).cloned())
    }

    async fn delete_draft(&self, id: Uuid) -> Result<(), BoxError> {
        guard(&self.drafts).remove(&id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySavedBookingStore {
    lists: Mutex<HashMap<String, VecDeque<Value>>>,
}

impl InMemorySavedBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SavedBookingStore for InMemorySavedBookingStore {
    async fn push_saved(&self, client_id: &str, entry: &Value, cap: usize) -> Result<(), BoxError> {
        let mut lists = guard(&self.lists);
        let list = lists.entry(client_id.to_string()).or_default();
        list.push_front(entry.clone());
        list.truncate(cap.max(1));
        Ok(())
    }

    async fn list_saved(&self, client_id: &str) -> Result<Vec<Value>, BoxError> {
        Ok(guard(&self.lists)
            .get(client_id)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn remove_saved(&self, client_id: &str, entry_id: Uuid) -> Result<bool, BoxError> {
        let mut lists = guard(&self.lists);
        let Some(list) = lists.get_mut(client_id) else {
            return Ok(false);
        };
        let target = entry_id.to_string();
        let position = list
            .iter()
            .position(|entry| entry.get("id").and_then(Value::as_str) == Some(target.as_str()));
        Ok(match position {
            Some(index) => list.remove(index).is_some(),
            None => false,
        })
    }
}

/// Keeps every published `(topic, key, payload)` instead of sending it.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<(String, String, String)>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(String, String, String)> {
        guard(&self.published).clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), BoxError> {
        tracing::debug!("Recorded event on {} for {}", topic, key);
        guard(&self.published).push((topic.to_string(), key.to_string(), payload.to_string()));
        Ok(())
    }
}
