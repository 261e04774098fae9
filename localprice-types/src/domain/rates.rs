//! Exchange-rate tables and the IP-geolocation record.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::CurrencyCode;

/// Conversion rates relative to `base_code`, as published by the rate provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base_code: CurrencyCode,
    pub rates: HashMap<CurrencyCode, f64>,
}

impl RateTable {
    pub fn new(base_code: CurrencyCode) -> Self {
        Self {
            base_code,
            rates: HashMap::new(),
        }
    }

    /// Builds a table from `(code, rate)` pairs. Codes are normalized.
    pub fn from_pairs<'a>(
        base_code: impl Into<CurrencyCode>,
        pairs: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Self {
        Self {
            base_code: base_code.into(),
            rates: pairs
                .into_iter()
                .map(|(code, rate)| (CurrencyCode::normalize(code), rate))
                .collect(),
        }
    }

    pub fn rate_for(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// The viewer's location as reported by the geolocation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationRecord {
    pub currency: CurrencyCode,
    pub country_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_lookup_is_normalized() {
        let table = RateTable::from_pairs("usd", [("eur", 0.88), ("GBP", 0.74)]);
        assert_eq!(table.base_code.as_str(), "USD");
        assert_eq!(table.rate_for(&CurrencyCode::from("EUR")), Some(0.88));
        assert_eq!(table.rate_for(&CurrencyCode::from("gbp")), Some(0.74));
        assert_eq!(table.rate_for(&CurrencyCode::from("XYZ")), None);
        assert_eq!(table.len(), 2);
    }
}
