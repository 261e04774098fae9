//! Normalized currency codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An uppercase currency code such as `USD` or `EUR`.
///
/// Codes are normalized (trimmed, uppercased) on construction but are NOT checked
/// against an ISO list: an unknown code passes through and is rejected later,
/// when it turns out to be missing from the provider's rate table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Normalizes a raw, case-insensitive code.
    pub fn normalize(code: &str) -> Self {
        Self(code.trim().to_uppercase())
    }

    /// Normalizes an optional code. Blank input counts as absent.
    pub fn normalize_optional(code: Option<&str>) -> Option<Self> {
        code.map(str::trim)
            .filter(|c| !c.is_empty())
            .map(Self::normalize)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        Self::normalize(code)
    }
}

impl From<String> for CurrencyCode {
    fn from(code: String) -> Self {
        Self::normalize(&code)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_uppercases() {
        assert_eq!(CurrencyCode::normalize("usd").as_str(), "USD");
        assert_eq!(CurrencyCode::normalize(" eUr ").as_str(), "EUR");
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        assert_eq!(CurrencyCode::normalize("xyz").as_str(), "XYZ");
    }

    #[test]
    fn test_blank_optional_is_absent() {
        assert_eq!(CurrencyCode::normalize_optional(None), None);
        assert_eq!(CurrencyCode::normalize_optional(Some("   ")), None);
        assert_eq!(
            CurrencyCode::normalize_optional(Some("gbp")),
            Some(CurrencyCode::from("GBP"))
        );
    }

    #[test]
    fn test_deserialize_normalizes() {
        let code: CurrencyCode = serde_json::from_str("\"inr\"").unwrap();
        assert_eq!(code.as_str(), "INR");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"INR\"");
    }
}
