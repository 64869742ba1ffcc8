use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FareConfig {
    /// Flat rate per passenger and leg, in cents. Children and seniors pay the adult rate.
    pub per_passenger_cents: i64,
    pub currency: String,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            per_passenger_cents: 7000,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fare {
    pub amount_cents: i64,
    pub currency: String,
    pub passenger_count: u32,
    pub return_trip: bool,
}

impl Fare {
    /// Amount in major units (dollars), for display.
    pub fn major_units(&self) -> f64 {
        self.amount_cents as f64 / 100.0
    }
}

/// Flat-rate fare engine
#[derive(Debug, Clone, Default)]
pub struct FareCalculator {
    config: FareConfig,
}

impl FareCalculator {
    pub fn new(config: FareConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FareConfig {
        &self.config
    }

    /// `passenger_count * rate`, doubled for a return trip.
    pub fn total(&self, passenger_count: u32, return_trip: bool) -> Fare {
        let legs = if return_trip { 2 } else { 1 };
        Fare {
            amount_cents: passenger_count as i64 * self.config.per_passenger_cents * legs,
            currency: self.config.currency.clone(),
            passenger_count,
            return_trip,
        }
    }

    /// Prefers the roster length; an empty roster falls back to the seat count.
    pub fn total_for(&self, roster_len: usize, seats: u32, return_trip: bool) -> Fare {
        let passenger_count = if roster_len > 0 { roster_len as u32 } else { seats };
        self.total(passenger_count, return_trip)
    }
}
