use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timeslot::TimeSlot;

/// A row of the routes table as stored, timings still raw strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteRecord {
    pub id: Uuid,
    pub from_location: String,
    pub to_location: String,
    pub price: f64,
    pub duration_minutes: i32,
    pub timings: Option<Vec<String>>,
    pub display_order: i32,
}

/// An origin/destination pair with its allowed departure slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub from_location: String,
    pub to_location: String,
    pub price: f64,
    pub duration_minutes: i32,
    pub timings: Vec<TimeSlot>,
    pub display_order: i32,
}

impl From<RouteRecord> for Route {
    fn from(record: RouteRecord) -> Self {
        let timings = TimeSlot::from_labels(record.timings.unwrap_or_default());
        Self {
            id: record.id,
            from_location: record.from_location.trim().to_string(),
            to_location: record.to_location.trim().to_string(),
            price: record.price,
            duration_minutes: record.duration_minutes,
            timings,
            display_order: record.display_order,
        }
    }
}
