//! Error types for local-currency conversion.

use crate::domain::CurrencyCode;

/// Why a conversion is unavailable.
///
/// Variants are listed in reporting precedence: when several apply at once,
/// the first one wins.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error(
        "Exchange rate API key is missing. Get a free access key from the exchange-rate provider (https://www.exchangerate-api.com) and pass it as the access key."
    )]
    MissingAccessKey,

    #[error("Base price must be a finite number, got {0}")]
    InvalidAmount(f64),

    #[error("{0}")]
    Geolocation(String),

    #[error("{0}")]
    ExchangeRate(String),

    #[error(
        "Currency '{0}' was detected from your location but is not supported by the exchange-rate provider"
    )]
    CurrencyMismatch(CurrencyCode),
}

impl ConversionError {
    /// Stable machine-readable classification.
    pub fn kind(&self) -> &'static str {
        match self {
            ConversionError::MissingAccessKey => "credential",
            ConversionError::InvalidAmount(_) => "invalid_amount",
            ConversionError::Geolocation(_) => "geolocation",
            ConversionError::ExchangeRate(_) => "exchange_rate",
            ConversionError::CurrencyMismatch(_) => "currency_mismatch",
        }
    }

    /// True for failures detected before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ConversionError::MissingAccessKey | ConversionError::InvalidAmount(_)
        )
    }
}

/// Failure reported by an outbound provider adapter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("{0}")]
    Transport(String),

    /// Non-2xx HTTP response.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// 2xx response whose payload reports a failure or cannot be understood.
    #[error("{0}")]
    Service(String),
}

impl ProviderError {
    /// Transport failures and 5xx responses are worth one more attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Status { status, .. } => *status >= 500,
            ProviderError::Service(_) => false,
        }
    }
}
