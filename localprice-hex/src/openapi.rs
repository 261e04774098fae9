//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use localprice_types::dto::{ConversionResponse, ConvertQuery, ErrorBody};
use utoipa::OpenApi;

// Dummy functions to generate path documentation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Convert an amount into the caller's local currency
///
/// The local currency is taken from `currency` when given, otherwise from IP geolocation.
/// Failed conversions still return the full snapshot so clients can show the base price.
#[utoipa::path(
    get,
    path = "/api/convert",
    tag = "conversion",
    params(
        ("amount" = f64, Query, description = "Amount in the base currency"),
        ("base" = Option<String>, Query, description = "Base currency code, defaults to USD"),
        ("currency" = Option<String>, Query, description = "Target currency; skips geolocation")
    ),
    responses(
        (status = 200, description = "Converted price", body = ConversionResponse),
        (status = 400, description = "Missing provider key or invalid amount", body = ConversionResponse),
        (status = 422, description = "Local currency not offered by the rate provider", body = ConversionResponse),
        (status = 429, description = "Rate limit exceeded"),
        (status = 502, description = "Geolocation or exchange-rate lookup failed", body = ConversionResponse)
    )
)]
async fn convert() {}

/// OpenAPI documentation for the LocalPrice API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "LocalPrice API",
        version = "1.0.0",
        description = "Converts prices into the visitor's local currency using IP geolocation and live exchange rates.",
        license(name = "MIT"),
    ),
    paths(health, convert),
    components(schemas(ConversionResponse, ErrorBody, ConvertQuery)),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "conversion", description = "Local price conversion"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/health"));
        assert!(doc.paths.paths.contains_key("/api/convert"));
    }
}
