use uuid::Uuid;

pub const ROUTES_CHANGED_TOPIC: &str = "routes.changed";
pub const BOOKING_CONFIRMED_TOPIC: &str = "booking.confirmed";

/// Kind of row change reported by the routes change feed.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteChange {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct RoutesChangedEvent {
    pub change: RouteChange,
    pub route_id: Option<Uuid>,
    pub timestamp: i64,
}

impl RoutesChangedEvent {
    pub fn now(change: RouteChange, route_id: Option<Uuid>) -> Self {
        Self {
            change,
            route_id,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingConfirmedEvent {
    pub draft_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub payment_reference: String,
    pub is_activity_booking: bool,
    pub passenger_count: u32,
    pub total_cents: i64,
    pub currency: String,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_change_wire_format() {
        let event = RoutesChangedEvent {
            change: RouteChange::Update,
            route_id: None,
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["change"], "UPDATE");

        let parsed: RoutesChangedEvent =
            serde_json::from_str(r#"{"change":"DELETE","route_id":null,"timestamp":1}"#).unwrap();
        assert_eq!(parsed.change, RouteChange::Delete);
    }
}
