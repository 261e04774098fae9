//! Exchange-rate provider access key.

use std::fmt;

use crate::error::ConversionError;

/// A validated, non-blank credential for the exchange-rate provider.
///
/// The raw value never appears in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessKey(String);

impl AccessKey {
    /// Validates a raw key.
    ///
    /// Absent, empty and whitespace-only keys are rejected with
    /// [`ConversionError::MissingAccessKey`]. Callers must run this before any
    /// network call is issued.
    pub fn parse(raw: Option<&str>) -> Result<Self, ConversionError> {
        match raw.map(str::trim) {
            Some(key) if !key.is_empty() => Ok(Self(key.to_string())),
            _ => Err(ConversionError::MissingAccessKey),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessKey(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_rejected() {
        for raw in [None, Some(""), Some("   "), Some("\t\n")] {
            assert_eq!(
                AccessKey::parse(raw),
                Err(ConversionError::MissingAccessKey)
            );
        }
    }

    #[test]
    fn test_key_is_trimmed() {
        let key = AccessKey::parse(Some("  abc123 ")).unwrap();
        assert_eq!(key.expose(), "abc123");
    }

    #[test]
    fn test_debug_redacts() {
        let key = AccessKey::parse(Some("secret")).unwrap();
        assert!(!format!("{:?}", key).contains("secret"));
    }

    #[test]
    fn test_error_names_the_provider() {
        let message = ConversionError::MissingAccessKey.to_string();
        assert!(message.contains("API key is missing"));
        assert!(message.contains("from the exchange-rate provider"));
    }
}
