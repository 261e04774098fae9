//! What a price widget should show for a given snapshot.

use std::fmt;

use super::{ConversionResult, CurrencyCode};

/// Presentation decision for one [`ConversionResult`].
#[derive(Debug, Clone, PartialEq)]
pub enum PriceDisplay {
    /// A fetch is outstanding; show a placeholder.
    Loading,
    /// Show the converted amount in the viewer's currency.
    Converted { amount: f64, currency: CurrencyCode },
    /// Conversion is unavailable; show the original amount with the reason as a tooltip.
    Fallback {
        amount: f64,
        currency: CurrencyCode,
        reason: String,
    },
}

impl PriceDisplay {
    pub fn from_result(result: &ConversionResult, base_price: f64) -> Self {
        if result.is_loading {
            return PriceDisplay::Loading;
        }
        match (&result.error, result.converted_price, &result.local_currency) {
            (None, Some(amount), Some(currency)) => PriceDisplay::Converted {
                amount,
                currency: currency.clone(),
            },
            (error, _, _) => PriceDisplay::Fallback {
                amount: base_price,
                currency: result.base_currency.clone(),
                reason: error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "Conversion unavailable".to_string()),
            },
        }
    }
}

impl fmt::Display for PriceDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceDisplay::Loading => write!(f, "..."),
            PriceDisplay::Converted { amount, currency } => write!(f, "{:.2} {}", amount, currency),
            PriceDisplay::Fallback {
                amount,
                currency,
                reason,
            } => write!(f, "{:.2} {} ({})", amount, currency, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;

    fn snapshot() -> ConversionResult {
        ConversionResult {
            converted_price: None,
            local_currency: None,
            base_currency: CurrencyCode::from("USD"),
            exchange_rate: None,
            is_loading: true,
            error: None,
        }
    }

    #[test]
    fn test_loading() {
        assert_eq!(
            PriceDisplay::from_result(&snapshot(), 100.0),
            PriceDisplay::Loading
        );
    }

    #[test]
    fn test_converted() {
        let result = ConversionResult {
            converted_price: Some(88.0),
            local_currency: Some(CurrencyCode::from("EUR")),
            exchange_rate: Some(0.88),
            is_loading: false,
            ..snapshot()
        };
        let display = PriceDisplay::from_result(&result, 100.0);
        assert_eq!(display.to_string(), "88.00 EUR");
    }

    #[test]
    fn test_error_falls_back_to_base_amount() {
        let result = ConversionResult {
            local_currency: Some(CurrencyCode::from("XYZ")),
            is_loading: false,
            error: Some(ConversionError::CurrencyMismatch(CurrencyCode::from("XYZ"))),
            ..snapshot()
        };
        match PriceDisplay::from_result(&result, 19.5) {
            PriceDisplay::Fallback {
                amount,
                currency,
                reason,
            } => {
                assert_eq!(amount, 19.5);
                assert_eq!(currency.as_str(), "USD");
                assert!(reason.contains("'XYZ'"));
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }
}
