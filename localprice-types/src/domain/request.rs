//! Conversion input and output snapshots.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use super::CurrencyCode;
use crate::error::ConversionError;

/// Invoked once when a conversion first settles successfully.
pub type SuccessCallback = Arc<dyn Fn(&ConversionResult) + Send + Sync>;

/// Invoked once when a conversion first settles with an error.
pub type ErrorCallback = Arc<dyn Fn(&ConversionError) + Send + Sync>;

/// What the caller wants displayed.
///
/// Currency codes are kept raw here; the pipeline normalizes them on every
/// evaluation, so `"usd"` and `"USD"` are the same request.
#[derive(Clone, Default)]
pub struct ConversionRequest {
    pub base_price: f64,
    pub base_currency: String,
    pub access_key: Option<String>,
    pub manual_currency: Option<String>,
    /// Address of the viewer. `None` geolocates the host running the pipeline.
    pub client_ip: Option<IpAddr>,
    pub on_success: Option<SuccessCallback>,
    pub on_error: Option<ErrorCallback>,
}

impl ConversionRequest {
    pub fn new(base_price: f64, base_currency: impl Into<String>) -> Self {
        Self {
            base_price,
            base_currency: base_currency.into(),
            ..Self::default()
        }
    }

    /// Sets the exchange-rate provider access key.
    pub fn with_access_key(mut self, key: impl Into<String>) -> Self {
        self.access_key = Some(key.into());
        self
    }

    /// Pins the target currency, bypassing geolocation.
    pub fn with_manual_currency(mut self, code: impl Into<String>) -> Self {
        self.manual_currency = Some(code.into());
        self
    }

    /// Geolocates `ip` instead of the local host.
    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    pub fn on_success(mut self, f: impl Fn(&ConversionResult) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&ConversionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ConversionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRequest")
            .field("base_price", &self.base_price)
            .field("base_currency", &self.base_currency)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .field("manual_currency", &self.manual_currency)
            .field("client_ip", &self.client_ip)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Immutable snapshot of a conversion, produced on every evaluation.
///
/// `converted_price` is `Some` if and only if the snapshot is not loading,
/// carries no error, and a rate was found for `local_currency`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub converted_price: Option<f64>,
    pub local_currency: Option<CurrencyCode>,
    pub base_currency: CurrencyCode,
    pub exchange_rate: Option<f64>,
    pub is_loading: bool,
    pub error: Option<ConversionError>,
}

impl ConversionResult {
    /// A snapshot that failed before any stage ran.
    pub fn failed(
        base_currency: CurrencyCode,
        local_currency: Option<CurrencyCode>,
        error: ConversionError,
    ) -> Self {
        Self {
            converted_price: None,
            local_currency,
            base_currency,
            exchange_rate: None,
            is_loading: false,
            error: Some(error),
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.is_loading
    }

    pub fn is_success(&self) -> bool {
        self.converted_price.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = ConversionRequest::new(100.0, "usd")
            .with_access_key("key")
            .with_manual_currency("gbp");
        assert_eq!(req.base_currency, "usd");
        assert_eq!(req.access_key.as_deref(), Some("key"));
        assert_eq!(req.manual_currency.as_deref(), Some("gbp"));
        assert!(req.on_success.is_none());
    }

    #[test]
    fn test_request_debug_hides_key() {
        let req = ConversionRequest::new(1.0, "USD").with_access_key("hunter2");
        assert!(!format!("{:?}", req).contains("hunter2"));
    }

    #[test]
    fn test_failed_snapshot() {
        let result = ConversionResult::failed(
            CurrencyCode::from("USD"),
            None,
            ConversionError::MissingAccessKey,
        );
        assert!(result.is_settled());
        assert!(!result.is_success());
        assert_eq!(result.converted_price, None);
    }
}
