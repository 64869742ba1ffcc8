use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A wrapper for passenger contact and document data that masks its value in Debug/Display output.
///
/// Serialization passes the real value through: draft sessions, booking rows and
/// the confirmation email all need it. The mask only protects log macros such as
/// `tracing::info!("{:?}", draft)`.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl Masked<String> {
    /// True when the wrapped string is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Partially hides an email address for log lines: `jane@example.com` -> `j***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_value() {
        let passport = Masked::new("P1234567".to_string());
        assert_eq!(format!("{:?}", passport), "********");
        assert_eq!(format!("{}", passport), "********");
        assert_eq!(passport.expose(), "P1234567");
    }

    #[test]
    fn test_serialize_passes_value_through() {
        let phone: Masked<String> = "7771234".into();
        assert_eq!(serde_json::to_string(&phone).unwrap(), "\"7771234\"");

        let back: Masked<String> = serde_json::from_str("\"7771234\"").unwrap();
        assert_eq!(back, phone);
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("jane@example.com"), "j***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
