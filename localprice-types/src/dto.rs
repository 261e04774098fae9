//! Data Transfer Objects (DTOs) for the HTTP boundary.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ConversionResult;
use crate::error::ConversionError;

/// Query string of `GET /api/convert`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConvertQuery {
    /// Amount in the base currency
    #[schema(example = 100.0)]
    pub amount: f64,
    /// Base currency code (case-insensitive)
    #[serde(default = "default_base")]
    #[schema(example = "USD")]
    pub base: String,
    /// Optional target currency; skips IP geolocation when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "EUR")]
    pub currency: Option<String>,
}

fn default_base() -> String {
    "USD".to_string()
}

/// Error detail attached to a conversion snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable class: credential, invalid_amount, geolocation, exchange_rate, currency_mismatch
    #[schema(example = "currency_mismatch")]
    pub kind: String,
    /// Human-readable explanation
    pub message: String,
}

impl From<&ConversionError> for ErrorBody {
    fn from(err: &ConversionError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Serialized [`ConversionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    #[schema(example = 88.0)]
    pub converted_price: Option<f64>,
    #[schema(example = "EUR")]
    pub local_currency: Option<String>,
    #[schema(example = "USD")]
    pub base_currency: String,
    #[schema(example = 0.88)]
    pub exchange_rate: Option<f64>,
    pub is_loading: bool,
    pub error: Option<ErrorBody>,
}

impl From<&ConversionResult> for ConversionResponse {
    fn from(result: &ConversionResult) -> Self {
        Self {
            converted_price: result.converted_price,
            local_currency: result.local_currency.as_ref().map(|c| c.to_string()),
            base_currency: result.base_currency.to_string(),
            exchange_rate: result.exchange_rate,
            is_loading: result.is_loading,
            error: result.error.as_ref().map(ErrorBody::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurrencyCode;

    #[test]
    fn test_response_is_camel_case() {
        let result = ConversionResult {
            converted_price: Some(74.0),
            local_currency: Some(CurrencyCode::from("GBP")),
            base_currency: CurrencyCode::from("USD"),
            exchange_rate: Some(0.74),
            is_loading: false,
            error: None,
        };
        let json = serde_json::to_value(ConversionResponse::from(&result)).unwrap();
        assert_eq!(json["convertedPrice"], 74.0);
        assert_eq!(json["localCurrency"], "GBP");
        assert_eq!(json["isLoading"], false);
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_query_defaults_base() {
        let query: ConvertQuery = serde_json::from_str(r#"{"amount": 5}"#).unwrap();
        assert_eq!(query.base, "USD");
        assert_eq!(query.currency, None);
    }
}
