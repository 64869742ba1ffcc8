pub mod booking;
pub mod events;
pub mod notification;
pub mod otp;
pub mod payment;
pub mod repository;
pub mod route;
pub mod timeslot;

pub use booking::{BookingRecord, NewBooking, Passenger, PassengerType, PaymentReference};
pub use route::{Route, RouteRecord};
pub use timeslot::TimeSlot;

/// Error type crossing the adapter traits (database, cache, hosted functions).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Unknown time slot: {0}")]
    UnknownTimeSlot(String),
    #[error("Invalid payment reference: {0}")]
    InvalidPaymentReference(String),
    #[error("Unknown passenger type: {0}")]
    UnknownPassengerType(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
