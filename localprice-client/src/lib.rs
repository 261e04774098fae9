//! # LocalPrice Client
//!
//! Outbound HTTP adapters implementing the provider ports:
//! - [`IpApiClient`] - IP geolocation (`ip-api.com` compatible)
//! - [`ExchangeRateApiClient`] - latest rate tables (`exchangerate-api.com` v6 compatible)
//!
//! Response interpretation lives in the pure [`parse_geolocation`] and
//! [`parse_rates`] functions so it can be tested without a network.

use std::collections::HashMap;
use std::net::IpAddr;

use async_trait::async_trait;
use localprice_types::{
    AccessKey, CurrencyCode, ExchangeRateProvider, GeolocationProvider, GeolocationRecord,
    ProviderError, RateTable,
};
use reqwest::{Client, Url};
use serde::Deserialize;

/// Default geolocation endpoint, restricted to the fields we read.
pub const DEFAULT_GEOLOCATION_URL: &str =
    "http://ip-api.com/json/?fields=status,message,currency,countryCode";

/// Default exchange-rate API root.
pub const DEFAULT_EXCHANGE_RATE_URL: &str = "https://v6.exchangerate-api.com/v6";

const GEOLOCATION_FAILED: &str = "Geolocation detection failed";

/// Maps a reqwest failure. The URL is stripped because the rate endpoint
/// carries the access key in its path.
fn transport(err: reqwest::Error) -> ProviderError {
    ProviderError::Transport(err.without_url().to_string())
}

/// Geolocation failures without a service message surface the generic text.
fn geolocation_transport(err: reqwest::Error) -> ProviderError {
    tracing::warn!(error = %err.without_url(), "geolocation request failed");
    ProviderError::Transport(GEOLOCATION_FAILED.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Geolocation
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeolocationPayload {
    status: Option<String>,
    currency: Option<String>,
    country_code: Option<String>,
    message: Option<String>,
}

/// Interprets a geolocation response.
///
/// A `"fail"` status or a non-2xx code is a failure; the payload's `message`
/// is surfaced verbatim when present.
pub fn parse_geolocation(status: u16, body: &str) -> Result<GeolocationRecord, ProviderError> {
    let payload = serde_json::from_str::<GeolocationPayload>(body).ok();
    let message = || {
        payload
            .as_ref()
            .and_then(|p| p.message.clone())
            .unwrap_or_else(|| GEOLOCATION_FAILED.to_string())
    };

    if !(200..300).contains(&status) {
        return Err(ProviderError::Status {
            status,
            message: message(),
        });
    }

    let Some(payload) = payload.as_ref() else {
        return Err(ProviderError::Service(GEOLOCATION_FAILED.to_string()));
    };
    if payload.status.as_deref() != Some("success") {
        return Err(ProviderError::Service(message()));
    }

    // A success without a currency is useless downstream
    let currency = CurrencyCode::normalize_optional(payload.currency.as_deref())
        .ok_or_else(|| ProviderError::Service(GEOLOCATION_FAILED.to_string()))?;

    Ok(GeolocationRecord {
        currency,
        country_code: payload.country_code.clone(),
    })
}

/// Geolocation adapter for `ip-api.com` style endpoints.
pub struct IpApiClient {
    url: String,
    http: Client,
}

impl IpApiClient {
    /// Creates a client for the given lookup URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, Client::new())
    }

    /// Creates a client sharing an existing connection pool.
    pub fn with_client(url: impl Into<String>, http: Client) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }

    /// Lookup URL for `client`: its address is appended to the path, keeping the query.
    fn lookup_url(&self, client: Option<IpAddr>) -> Result<Url, ProviderError> {
        let invalid = || ProviderError::Service(format!("Invalid geolocation URL: {}", self.url));
        let mut url = Url::parse(&self.url).map_err(|_| invalid())?;
        if let Some(ip) = client {
            url.path_segments_mut()
                .map_err(|_| invalid())?
                .pop_if_empty()
                .push(&ip.to_string());
        }
        Ok(url)
    }
}

impl Default for IpApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_GEOLOCATION_URL)
    }
}

#[async_trait]
impl GeolocationProvider for IpApiClient {
    async fn locate(&self, client: Option<IpAddr>) -> Result<GeolocationRecord, ProviderError> {
        tracing::debug!(url = %self.url, ?client, "detecting location");
        let resp = self
            .http
            .get(self.lookup_url(client)?)
            .send()
            .await
            .map_err(geolocation_transport)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(geolocation_transport)?;
        parse_geolocation(status, &body)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exchange rates
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RatesPayload {
    result: Option<String>,
    base_code: Option<String>,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
    #[serde(rename = "error-type", alias = "error_type")]
    error_type: Option<String>,
    #[serde(rename = "error-message", alias = "error_message")]
    error_message: Option<String>,
}

impl RatesPayload {
    fn failure_message(&self) -> Option<String> {
        self.error_message.clone().or_else(|| {
            self.error_type
                .as_ref()
                .map(|t| format!("Exchange rate API error: {}", t))
        })
    }
}

/// Interprets a latest-rates response for `base`.
///
/// An `"error"` result or a non-2xx code is a failure. `error-message` is
/// preferred over a message built from `error-type`.
pub fn parse_rates(
    status: u16,
    body: &str,
    base: &CurrencyCode,
) -> Result<RateTable, ProviderError> {
    let payload = serde_json::from_str::<RatesPayload>(body).ok();

    if !(200..300).contains(&status) {
        let message = payload
            .as_ref()
            .and_then(RatesPayload::failure_message)
            .unwrap_or_else(|| format!("Exchange rate API error: HTTP {}", status));
        return Err(ProviderError::Status { status, message });
    }

    let Some(payload) = payload else {
        return Err(ProviderError::Service(
            "Exchange rate API error: malformed response".to_string(),
        ));
    };
    if payload.result.as_deref() != Some("success") {
        let message = payload
            .failure_message()
            .unwrap_or_else(|| "Exchange rate API error: unknown".to_string());
        return Err(ProviderError::Service(message));
    }

    let base_code = payload
        .base_code
        .as_deref()
        .map(CurrencyCode::normalize)
        .unwrap_or_else(|| base.clone());
    Ok(RateTable {
        base_code,
        rates: payload
            .conversion_rates
            .into_iter()
            .map(|(code, rate)| (CurrencyCode::from(code), rate))
            .collect(),
    })
}

/// Exchange-rate adapter for `exchangerate-api.com` v6 style endpoints.
pub struct ExchangeRateApiClient {
    base_url: String,
    http: Client,
}

impl ExchangeRateApiClient {
    /// Creates a client rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Creates a client sharing an existing connection pool.
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn latest_url(&self, access_key: &AccessKey, base: &CurrencyCode) -> String {
        format!("{}/{}/latest/{}", self.base_url, access_key.expose(), base)
    }
}

impl Default for ExchangeRateApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_EXCHANGE_RATE_URL)
    }
}

#[async_trait]
impl ExchangeRateProvider for ExchangeRateApiClient {
    async fn latest_rates(
        &self,
        access_key: &AccessKey,
        base: &CurrencyCode,
    ) -> Result<RateTable, ProviderError> {
        tracing::debug!(base = %base, "fetching latest exchange rates");
        let resp = self
            .http
            .get(self.latest_url(access_key, base))
            .send()
            .await
            .map_err(transport)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport)?;
        parse_rates(status, &body, base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> CurrencyCode {
        CurrencyCode::from("USD")
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = ExchangeRateApiClient::new("https://rates.test/v6/");
        assert_eq!(client.base_url, "https://rates.test/v6");
    }

    #[test]
    fn test_latest_url() {
        let client = ExchangeRateApiClient::new("https://rates.test/v6");
        let key = AccessKey::parse(Some("abc123")).unwrap();
        assert_eq!(
            client.latest_url(&key, &CurrencyCode::from("eur")),
            "https://rates.test/v6/abc123/latest/EUR"
        );
    }

    #[test]
    fn test_default_geolocation_url() {
        let client = IpApiClient::default();
        assert_eq!(client.url, DEFAULT_GEOLOCATION_URL);
    }

    #[test]
    fn test_lookup_url_appends_client_address() {
        let client = IpApiClient::default();
        assert_eq!(client.lookup_url(None).unwrap().as_str(), DEFAULT_GEOLOCATION_URL);
        assert_eq!(
            client
                .lookup_url(Some("203.0.113.7".parse().unwrap()))
                .unwrap()
                .as_str(),
            "http://ip-api.com/json/203.0.113.7?fields=status,message,currency,countryCode"
        );
    }

    #[test]
    fn test_lookup_url_rejects_invalid_endpoint() {
        let client = IpApiClient::new("not a url");
        assert!(matches!(client.lookup_url(None), Err(ProviderError::Service(_))));
    }

    #[tokio::test]
    async fn test_geolocation_transport_failure_is_generic() {
        // Nothing listens on the discard port
        let client = IpApiClient::new("http://127.0.0.1:9/json/");
        let err = client.locate(None).await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::Transport("Geolocation detection failed".to_string())
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_geolocation_success() {
        let body = r#"{"status":"success","currency":"eur","countryCode":"DE"}"#;
        let record = parse_geolocation(200, body).unwrap();
        assert_eq!(record.currency, CurrencyCode::from("EUR"));
        assert_eq!(record.country_code.as_deref(), Some("DE"));
    }

    #[test]
    fn test_geolocation_fail_status_surfaces_message() {
        let body = r#"{"status":"fail","message":"reserved range"}"#;
        let err = parse_geolocation(200, body).unwrap_err();
        assert_eq!(err, ProviderError::Service("reserved range".to_string()));
    }

    #[test]
    fn test_geolocation_fail_without_message_is_generic() {
        let err = parse_geolocation(200, r#"{"status":"fail"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Geolocation detection failed");
    }

    #[test]
    fn test_geolocation_http_error() {
        let err = parse_geolocation(503, "Service Unavailable").unwrap_err();
        assert_eq!(
            err,
            ProviderError::Status {
                status: 503,
                message: "Geolocation detection failed".to_string()
            }
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_geolocation_without_currency_is_error() {
        let err = parse_geolocation(200, r#"{"status":"success","currency":" "}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Service(_)));
    }

    #[test]
    fn test_rates_success() {
        let body = r#"{
            "result": "success",
            "base_code": "USD",
            "conversion_rates": {"USD": 1, "EUR": 0.88, "GBP": 0.74}
        }"#;
        let table = parse_rates(200, body, &usd()).unwrap();
        assert_eq!(table.base_code, usd());
        assert_eq!(table.rate_for(&CurrencyCode::from("EUR")), Some(0.88));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_rates_prefers_error_message() {
        let body = r#"{"result":"error","error-type":"invalid-key","error-message":"Key revoked"}"#;
        let err = parse_rates(200, body, &usd()).unwrap_err();
        assert_eq!(err.to_string(), "Key revoked");
    }

    #[test]
    fn test_rates_error_type_fallback() {
        let body = r#"{"result":"error","error-type":"unsupported-code"}"#;
        let err = parse_rates(200, body, &usd()).unwrap_err();
        assert_eq!(err.to_string(), "Exchange rate API error: unsupported-code");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rates_http_error_with_payload() {
        let body = r#"{"result":"error","error_type":"invalid-key"}"#;
        let err = parse_rates(403, body, &usd()).unwrap_err();
        assert_eq!(
            err,
            ProviderError::Status {
                status: 403,
                message: "Exchange rate API error: invalid-key".to_string()
            }
        );
    }

    #[test]
    fn test_rates_http_error_without_payload() {
        let err = parse_rates(502, "<html>Bad Gateway</html>", &usd()).unwrap_err();
        assert_eq!(err.to_string(), "Exchange rate API error: HTTP 502");
        assert!(err.is_retryable());
    }
}
