use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    pub functions: FunctionsConfig,
    pub booking: BookingRules,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

fn default_rate_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_group_id")]
    pub group_id: String,
}

fn default_group_id() -> String {
    "atoll-api".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FunctionsMode {
    #[default]
    Remote,
    Mock,
}

/// Hosted functions: payment create/verify, confirmation email, booking OTP.
#[derive(Debug, Deserialize, Clone)]
pub struct FunctionsConfig {
    pub base_url: String,
    pub anon_key: String,
    #[serde(default = "default_sign_method")]
    pub sign_method: String,
    /// Site origin quoted in confirmation emails.
    pub origin: String,
    #[serde(default)]
    pub mode: FunctionsMode,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_sign_method() -> String {
    "sha1".to_string()
}

fn default_timeout() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    #[serde(default = "default_fare")]
    pub fare_per_passenger_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_saved_cap")]
    pub saved_bookings_cap: usize,
    #[serde(default)]
    pub persist_before_payment: bool,
    #[serde(default = "default_draft_ttl")]
    pub draft_ttl_seconds: u64,
}

fn default_fare() -> i64 {
    7000
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_saved_cap() -> usize {
    20
}

fn default_draft_ttl() -> u64 {
    86_400
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            fare_per_passenger_cents: default_fare(),
            currency: default_currency(),
            saved_bookings_cap: default_saved_cap(),
            persist_before_payment: false,
            draft_ttl_seconds: default_draft_ttl(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub mode: StorageMode,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `ATOLL__BOOKING__PERSIST_BEFORE_PAYMENT=true`
            .add_source(config::Environment::with_prefix("ATOLL").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let raw = r#"
            [server]
            port = 3000
            [database]
            url = "postgres://localhost/atoll"
            [redis]
            url = "redis://localhost"
            [kafka]
            brokers = "localhost:9092"
            [auth]
            jwt_secret = "secret"
            jwt_expiration_seconds = 3600
            [functions]
            base_url = "http://localhost:54321/functions/v1"
            anon_key = "anon"
            origin = "http://localhost:5173"
            [booking]
        "#;
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.rate_limit_per_minute, 100);
        assert!(!config.kafka.enabled);
        assert_eq!(config.functions.sign_method, "sha1");
        assert_eq!(config.functions.mode, FunctionsMode::Remote);
        assert_eq!(config.booking.fare_per_passenger_cents, 7000);
        assert_eq!(config.booking.saved_bookings_cap, 20);
        assert!(!config.booking.persist_before_payment);
        assert_eq!(config.storage.mode, StorageMode::Postgres);
    }
}
