//! In-process stand-ins for the hosted functions, used by `functions.mode = "mock"` and tests.

use async_trait::async_trait;
use atoll_core::notification::{ConfirmationEmail, ConfirmationMailer};
use atoll_core::otp::{OtpService, OtpValidation};
use atoll_core::payment::{
    CreatePaymentRequest, CreatePaymentResponse, PaymentGateway, VerifyPaymentResponse,
    CONFIRMED_STATUS,
};
use atoll_core::BoxError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fake gateway. Transaction ids are `mock_tx_<reference>` so verification can echo the reference.
pub struct MockPaymentGateway {
    status: Mutex<String>,
    omit_url: bool,
    requests: Mutex<Vec<CreatePaymentRequest>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(CONFIRMED_STATUS.to_string()),
            omit_url: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Responds to create without a redirect URL.
    pub fn without_redirect() -> Self {
        Self {
            omit_url: true,
            ..Self::new()
        }
    }

    pub fn set_status(&self, status: &str) {
        *guard(&self.status) = status.to_string();
    }

    pub fn requests(&self) -> Vec<CreatePaymentRequest> {
        guard(&self.requests).clone()
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_transaction(
        &self,
        request: &CreatePaymentRequest,
        _access_token: Option<&str>,
    ) -> Result<CreatePaymentResponse, BoxError> {
        // Trigger for exercising the circuit breaker
        if request.customer_reference.contains("fail-gateway") {
            return Err("Simulated payment gateway failure".into());
        }
        guard(&self.requests).push(request.clone());

        let id = format!("mock_tx_{}", request.payment_reference);
        let url = (!self.omit_url).then(|| format!("https://pay.example.test/checkout/{id}"));
        Ok(CreatePaymentResponse { id: Some(id), url })
    }

    async fn verify_transaction(
        &self,
        transaction_id: &str,
        _access_token: Option<&str>,
    ) -> Result<VerifyPaymentResponse, BoxError> {
        let reference = transaction_id.strip_prefix("mock_tx_").map(str::to_string);
        Ok(VerifyPaymentResponse {
            status: Some(guard(&self.status).to_lowercase()),
            state: None,
            booking_reference: reference,
            details: None,
        })
    }
}

/// Records confirmation emails instead of sending them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<ConfirmationEmail>>,
    fail_with: Option<String>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<ConfirmationEmail> {
        guard(&self.sent).clone()
    }
}

#[async_trait]
impl ConfirmationMailer for RecordingMailer {
    async fn send_confirmation(&self, email: &ConfirmationEmail) -> Result<(), BoxError> {
        if let Some(message) = &self.fail_with {
            return Err(message.clone().into());
        }
        guard(&self.sent).push(email.clone());
        tracing::info!("Mock confirmation email recorded for {}", email.booking_details.origin);
        Ok(())
    }
}

/// Issues a fixed code per email.
pub struct MockOtpService {
    code: String,
    issued: Mutex<HashMap<String, String>>,
}

impl MockOtpService {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            issued: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MockOtpService {
    fn default() -> Self {
        Self::new("123456")
    }
}

#[async_trait]
impl OtpService for MockOtpService {
    async fn send_code(&self, email: &str) -> Result<(), BoxError> {
        guard(&self.issued).insert(email.to_lowercase(), self.code.clone());
        Ok(())
    }

    async fn validate_code(&self, email: &str, code: &str) -> Result<OtpValidation, BoxError> {
        let issued = guard(&self.issued);
        Ok(match issued.get(&email.to_lowercase()) {
            Some(expected) if expected == code => OtpValidation {
                valid: true,
                error: None,
            },
            Some(_) => OtpValidation {
                valid: false,
                error: Some("Invalid code".to_string()),
            },
            None => OtpValidation {
                valid: false,
                error: Some("No code requested for this email".to_string()),
            },
        })
    }
}
