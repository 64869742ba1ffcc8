use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use crate::app_config::BookingRules;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay rows of `booking_rules` (`{"value": ...}`) on the configured defaults.
    pub async fn fetch_booking_rules(&self, defaults: BookingRules) -> Result<BookingRules, sqlx::Error> {
        let rows: Vec<(String, Value)> =
            sqlx::query_as("SELECT rule_key, rule_value FROM booking_rules")
                .fetch_all(&self.pool)
                .await?;

        Ok(apply_rules(defaults, rows))
    }
}

fn apply_rules(defaults: BookingRules, rows: Vec<(String, Value)>) -> BookingRules {
    let mut rules = defaults;
    for (key, value) in rows {
        let Some(v) = value.get("value") else {
            continue;
        };
        match key.as_str() {
            "fare_per_passenger_cents" => {
                if let Some(n) = v.as_i64() {
                    rules.fare_per_passenger_cents = n;
                }
            }
            "currency" => {
                if let Some(s) = v.as_str() {
                    rules.currency = s.to_string();
                }
            }
            "saved_bookings_cap" => {
                if let Some(n) = v.as_u64() {
                    rules.saved_bookings_cap = n as usize;
                }
            }
            "persist_before_payment" => {
                if let Some(b) = v.as_bool() {
                    rules.persist_before_payment = b;
                }
            }
            "draft_ttl_seconds" => {
                if let Some(n) = v.as_u64() {
                    rules.draft_ttl_seconds = n;
                }
            }
            other => tracing::debug!("Ignoring unknown booking rule {}", other),
        }
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rules_overlay_defaults() {
        let rows = vec![
            ("fare_per_passenger_cents".to_string(), json!({"value": 7500})),
            ("persist_before_payment".to_string(), json!({"value": true})),
            ("saved_bookings_cap".to_string(), json!({"value": "lots"})),
            ("unknown".to_string(), json!({"value": 1})),
        ];
        let rules = apply_rules(BookingRules::default(), rows);
        assert_eq!(rules.fare_per_passenger_cents, 7500);
        assert!(rules.persist_before_payment);
        assert_eq!(rules.saved_bookings_cap, 20);
    }
}
