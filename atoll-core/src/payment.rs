use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::BoxError;

pub const CONFIRMED_STATUS: &str = "CONFIRMED";

/// Body of the hosted payment-initiation function.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub amount_cents: i64,
    pub currency: String,
    pub sign_method: String,
    pub payment_reference: String,
    pub customer_reference: String,
    /// Draft fields, spread into the top-level object.
    #[serde(flatten)]
    pub booking: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CreatePaymentResponse {
    pub id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub status: Option<String>,
    pub state: Option<String>,
    pub booking_reference: Option<String>,
    pub details: Option<Value>,
}

impl VerifyPaymentResponse {
    /// Gateway status, preferring `status` over `state`, upper-cased.
    pub fn normalized_status(&self) -> String {
        self.status
            .as_deref()
            .or(self.state.as_deref())
            .unwrap_or_default()
            .trim()
            .to_uppercase()
    }

    pub fn is_confirmed(&self) -> bool {
        self.normalized_status() == CONFIRMED_STATUS
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a hosted transaction. `access_token` is the caller's session token;
    /// implementations fall back to their anonymous key when it is absent.
    async fn create_transaction(
        &self,
        request: &CreatePaymentRequest,
        access_token: Option<&str>,
    ) -> Result<CreatePaymentResponse, BoxError>;

    /// Look up the outcome of a transaction after the redirect round trip.
    async fn verify_transaction(
        &self,
        transaction_id: &str,
        access_token: Option<&str>,
    ) -> Result<VerifyPaymentResponse, BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_flattens_booking_fields() {
        let mut booking = Map::new();
        booking.insert("from".to_string(), Value::from("Male"));

        let request = CreatePaymentRequest {
            amount_cents: 14000,
            currency: "USD".to_string(),
            sign_method: "sha1".to_string(),
            payment_reference: "RTM-1234".to_string(),
            customer_reference: "Booking for Male to Dhigurah".to_string(),
            booking,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["amountCents"], 14000);
        assert_eq!(json["signMethod"], "sha1");
        assert_eq!(json["from"], "Male");
    }

    #[test]
    fn test_status_is_case_insensitive() {
        let response: VerifyPaymentResponse = serde_json::from_str(r#"{"status":"confirmed"}"#).unwrap();
        assert!(response.is_confirmed());

        let response: VerifyPaymentResponse = serde_json::from_str(r#"{"state":"Confirmed"}"#).unwrap();
        assert!(response.is_confirmed());

        let response: VerifyPaymentResponse = serde_json::from_str(r#"{"status":"CANCELLED","state":"CONFIRMED"}"#).unwrap();
        assert!(!response.is_confirmed());

        assert!(!VerifyPaymentResponse::default().is_confirmed());
    }
}
