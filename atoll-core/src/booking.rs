use atoll_shared::pii::Masked;
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassengerType {
    #[default]
    Adult,
    Child,
    Senior,
}

impl FromStr for PassengerType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adult" => Ok(PassengerType::Adult),
            "child" => Ok(PassengerType::Child),
            "senior" => Ok(PassengerType::Senior),
            _ => Err(CoreError::UnknownPassengerType(s.to_string())),
        }
    }
}

/// One roster entry, as stored inside `bookings.passenger_info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    pub id: u32,
    pub name: String,
    pub passport: Masked<String>,
    #[serde(default)]
    pub email: Masked<String>,
    #[serde(default)]
    pub phone: Masked<String>,
    #[serde(default)]
    pub country_code: String,
    #[serde(rename = "type", default)]
    pub passenger_type: PassengerType,
}

impl Passenger {
    pub fn blank(id: u32, passenger_type: PassengerType) -> Self {
        Self {
            id,
            passenger_type,
            ..Default::default()
        }
    }
}

/// Short, shareable booking identifier: `RTM-` followed by four digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaymentReference(String);

impl PaymentReference {
    pub const PREFIX: &'static str = "RTM-";

    pub fn generate() -> Self {
        let digits: u16 = rand::thread_rng().gen_range(1000..=9999);
        Self(format!("{}{}", Self::PREFIX, digits))
    }

    pub fn parse(value: &str) -> CoreResult<Self> {
        let value = value.trim().to_ascii_uppercase();
        let digits = value
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| CoreError::InvalidPaymentReference(value.clone()))?;

        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::InvalidPaymentReference(value));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PaymentReference {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PaymentReference> for String {
    fn from(value: PaymentReference) -> Self {
        value.0
    }
}

/// Flattened booking row, ready for insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub user_email: String,
    pub from_location: Option<String>,
    pub to_location: Option<String>,
    pub departure_time: Option<String>,
    pub departure_date: NaiveDate,
    pub return_trip: bool,
    pub return_from_location: Option<String>,
    pub return_to_location: Option<String>,
    pub return_time: Option<String>,
    pub return_date: Option<NaiveDate>,
    pub passenger_count: i32,
    pub payment_complete: bool,
    pub payment_reference: Option<String>,
    pub passenger_info: Vec<Passenger>,
    pub activity: Option<String>,
    pub is_activity_booking: bool,
}

/// A booking row as read back from the bookings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub booking: NewBooking,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn from_new(booking: NewBooking) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking,
            created_at: Utc::now(),
        }
    }
}
