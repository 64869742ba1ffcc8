use async_trait::async_trait;
use serde::Serialize;

use crate::BoxError;

/// Body of the hosted `send-confirmation` function.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationEmail {
    pub email: String,
    pub name: String,
    pub booking_details: BookingDetails,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub return_trip: bool,
    pub return_date: Option<String>,
    pub return_time: Option<String>,
    pub passenger_count: u32,
    pub payment_reference: Option<String>,
    pub origin: String,
    pub outbound_speedboat_name: Option<String>,
    pub return_speedboat_name: Option<String>,
    pub is_activity_booking: bool,
    pub activity: Option<String>,
    pub activity_date: Option<String>,
    pub activity_time: Option<String>,
}

#[async_trait]
pub trait ConfirmationMailer: Send + Sync {
    async fn send_confirmation(&self, email: &ConfirmationEmail) -> Result<(), BoxError>;
}
