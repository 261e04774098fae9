//! Offline Exchange Rates and Geolocation
//!
//! Provider adapters that never touch the network: a fixed rate table and a
//! fixed location. They back the CLI's `--offline` mode and the HTTP tests.
//!
//! Rates are declared once, as units per US dollar, using a macro. Tables for
//! any other base are derived by cross rate.
//!
//! # Adding a New Currency
//! Add a line to the `define_rates!` invocation:
//! ```ignore
//! define_rates! {
//!     // ... existing currencies ...
//!     SEK => 10.45,
//! }
//! ```
//!
//! # Example
//! ```
//! use exchange_rates::{units_per_usd, cross_rate};
//!
//! assert_eq!(units_per_usd("usd"), Some(1.0));
//! assert!(cross_rate("USD", "INR").unwrap() > 80.0);
//! ```

use std::net::IpAddr;

use async_trait::async_trait;
use localprice_types::{
    AccessKey, CurrencyCode, ExchangeRateProvider, GeolocationProvider, GeolocationRecord,
    ProviderError, RateTable,
};

// ─────────────────────────────────────────────────────────────────────────────
// THE MACRO: Declares the USD-relative rate table
// ─────────────────────────────────────────────────────────────────────────────

/// Declares the supported currencies and their USD rates.
///
/// # Syntax
/// ```ignore
/// define_rates! {
///     CODE => units_per_usd,
/// }
/// ```
macro_rules! define_rates {
    ($($code:ident => $per_usd:expr),* $(,)?) => {
        /// Currency codes with a known offline rate.
        pub const SUPPORTED: &[&str] = &[$(stringify!($code)),*];

        /// Units of `code` that one US dollar buys.
        pub fn units_per_usd(code: &str) -> Option<f64> {
            match code.trim().to_uppercase().as_str() {
                $(stringify!($code) => Some($per_usd),)*
                _ => None,
            }
        }
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// RATE DEFINITIONS
// ─────────────────────────────────────────────────────────────────────────────

define_rates! {
    USD => 1.0,
    EUR => 0.92,
    GBP => 0.79,
    INR => 83.12,
    JPY => 149.5,
    CAD => 1.36,
    AUD => 1.52,
    CHF => 0.88,
    CNY => 7.24,
    MXN => 17.1,
    BRL => 4.97,
}

/// Units of `to` per one unit of `from`.
pub fn cross_rate(from: &str, to: &str) -> Option<f64> {
    let from = units_per_usd(from)?;
    let to = units_per_usd(to)?;
    Some(to / from)
}

// ─────────────────────────────────────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────────────────────────────────────

/// Exchange-rate provider backed by the built-in table.
///
/// Accepts any access key. Unknown bases fail the way the live service does.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRates;

impl StaticRates {
    pub fn new() -> Self {
        Self
    }

    /// Full table for `base`, or `None` if the base is not supported.
    pub fn table(base: &CurrencyCode) -> Option<RateTable> {
        units_per_usd(base.as_str())?;
        let pairs: Vec<(&str, f64)> = SUPPORTED
            .iter()
            .filter_map(|code| cross_rate(base.as_str(), code).map(|rate| (*code, rate)))
            .collect();
        Some(RateTable::from_pairs(base.as_str(), pairs))
    }
}

#[async_trait]
impl ExchangeRateProvider for StaticRates {
    async fn latest_rates(
        &self,
        _access_key: &AccessKey,
        base: &CurrencyCode,
    ) -> Result<RateTable, ProviderError> {
        Self::table(base).ok_or_else(|| {
            ProviderError::Service("Exchange rate API error: unsupported-code".to_string())
        })
    }
}

/// Geolocation provider that reports the same place for every address.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    record: Option<GeolocationRecord>,
}

impl FixedLocation {
    /// Reports `currency` (normalized) for every lookup.
    pub fn new(currency: &str) -> Self {
        Self {
            record: Some(GeolocationRecord {
                currency: CurrencyCode::normalize(currency),
                country_code: None,
            }),
        }
    }

    /// Reports `currency` together with a country code.
    pub fn with_country(currency: &str, country_code: &str) -> Self {
        Self {
            record: Some(GeolocationRecord {
                currency: CurrencyCode::normalize(currency),
                country_code: Some(country_code.to_string()),
            }),
        }
    }

    /// A location that can never be detected.
    pub fn unavailable() -> Self {
        Self { record: None }
    }
}

#[async_trait]
impl GeolocationProvider for FixedLocation {
    async fn locate(&self, _client: Option<IpAddr>) -> Result<GeolocationRecord, ProviderError> {
        self.record.clone().ok_or_else(|| {
            ProviderError::Service("Geolocation unavailable in offline mode".to_string())
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> AccessKey {
        AccessKey::parse(Some("offline")).unwrap()
    }

    #[test]
    fn test_units_per_usd_is_case_insensitive() {
        assert_eq!(units_per_usd("inr"), Some(83.12));
        assert_eq!(units_per_usd(" EUR "), Some(0.92));
        assert_eq!(units_per_usd("XYZ"), None);
    }

    #[test]
    fn test_cross_rate() {
        assert_eq!(cross_rate("USD", "USD"), Some(1.0));
        let eur_to_usd = cross_rate("EUR", "USD").unwrap();
        assert!((eur_to_usd - 1.0 / 0.92).abs() < 1e-9);
        assert_eq!(cross_rate("USD", "XYZ"), None);
    }

    #[test]
    fn test_table_contains_every_currency() {
        let table = StaticRates::table(&CurrencyCode::from("GBP")).unwrap();
        assert_eq!(table.len(), SUPPORTED.len());
        assert_eq!(table.rate_for(&CurrencyCode::from("GBP")), Some(1.0));
        assert_eq!(table.base_code, CurrencyCode::from("GBP"));
    }

    #[tokio::test]
    async fn test_latest_rates() {
        let table = StaticRates::new()
            .latest_rates(&key(), &CurrencyCode::from("USD"))
            .await
            .unwrap();
        assert_eq!(table.rate_for(&CurrencyCode::from("INR")), Some(83.12));
    }

    #[tokio::test]
    async fn test_unsupported_base_is_service_error() {
        let err = StaticRates::new()
            .latest_rates(&key(), &CurrencyCode::from("XYZ"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Service(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_fixed_location() {
        let record = FixedLocation::with_country("inr", "IN")
            .locate(None)
            .await
            .unwrap();
        assert_eq!(record.currency, CurrencyCode::from("INR"));
        assert_eq!(record.country_code.as_deref(), Some("IN"));

        let client = "203.0.113.7".parse().unwrap();
        assert!(FixedLocation::unavailable().locate(Some(client)).await.is_err());
    }
}
