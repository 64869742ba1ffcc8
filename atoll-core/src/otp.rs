use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::BoxError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtpValidation {
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Hosted one-time-code functions guarding the booking lookup.
#[async_trait]
pub trait OtpService: Send + Sync {
    /// Issue (or replace) the active code for `email` and mail it.
    async fn send_code(&self, email: &str) -> Result<(), BoxError>;

    async fn validate_code(&self, email: &str, code: &str) -> Result<OtpValidation, BoxError>;
}
