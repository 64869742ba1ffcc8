use async_trait::async_trait;
use atoll_core::notification::{ConfirmationEmail, ConfirmationMailer};
use atoll_core::otp::{OtpService, OtpValidation};
use atoll_core::payment::{
    CreatePaymentRequest, CreatePaymentResponse, PaymentGateway, VerifyPaymentResponse,
};
use atoll_core::BoxError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::app_config::FunctionsConfig;

/// Client for the hosted edge functions (payment, confirmation email, booking OTP).
#[derive(Clone)]
pub struct HostedFunctions {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl HostedFunctions {
    pub fn new(config: &FunctionsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn url(&self, function: &str) -> String {
        format!("{}/{}", self.base_url, function)
    }

    /// POST to a function, returning the HTTP status and the decoded JSON body (`null` if none).
    async fn call<B>(&self, function: &str, body: &B, access_token: Option<&str>) -> Result<(u16, Value), BoxError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let token = access_token.unwrap_or(&self.anon_key);
        let response = self
            .client
            .post(self.url(function))
            .bearer_auth(token)
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let payload: Value = response.json().await.unwrap_or(Value::Null);
        Ok((status, payload))
    }

    async fn invoke<B, R>(&self, function: &str, body: &B, access_token: Option<&str>) -> Result<R, BoxError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let (status, payload) = self.call(function, body, access_token).await?;
        if !(200..300).contains(&status) {
            return Err(function_error(function, status, &payload).into());
        }
        Ok(serde_json::from_value(payload)?)
    }
}

fn function_error(function: &str, status: u16, payload: &Value) -> String {
    let detail = payload
        .get("error")
        .map(|e| e.to_string())
        .unwrap_or_else(|| payload.to_string());
    format!("{} returned {}: {}", function, status, detail)
}

#[async_trait]
impl PaymentGateway for HostedFunctions {
    async fn create_transaction(
        &self,
        request: &CreatePaymentRequest,
        access_token: Option<&str>,
    ) -> Result<CreatePaymentResponse, BoxError> {
        self.invoke("bml-payment/create", request, access_token).await
    }

    async fn verify_transaction(
        &self,
        transaction_id: &str,
        access_token: Option<&str>,
    ) -> Result<VerifyPaymentResponse, BoxError> {
        let body = json!({ "transactionId": transaction_id });
        self.invoke("bml-payment/verify", &body, access_token).await
    }
}

#[async_trait]
impl ConfirmationMailer for HostedFunctions {
    async fn send_confirmation(&self, email: &ConfirmationEmail) -> Result<(), BoxError> {
        let (status, payload) = self.call("send-confirmation", email, None).await?;
        // The function answers `{}` on success and `{error}` otherwise.
        if !(200..300).contains(&status) || payload.get("error").is_some_and(|e| !e.is_null()) {
            return Err(function_error("send-confirmation", status, &payload).into());
        }
        Ok(())
    }
}

#[async_trait]
impl OtpService for HostedFunctions {
    async fn send_code(&self, email: &str) -> Result<(), BoxError> {
        let _: Value = self
            .invoke("process-booking-otp", &json!({ "email": email }), None)
            .await?;
        Ok(())
    }

    async fn validate_code(&self, email: &str, code: &str) -> Result<OtpValidation, BoxError> {
        let (status, payload) = self
            .call(
                "validate-booking-otp",
                &json!({ "email": email, "code": code }),
                None,
            )
            .await?;
        // A rejected code may come back as a 4xx that still carries `{valid, error}`.
        match serde_json::from_value::<OtpValidation>(payload.clone()) {
            Ok(validation) => Ok(validation),
            Err(_) => Err(function_error("validate-booking-otp", status, &payload).into()),
        }
    }
}
