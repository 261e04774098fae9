//! HTTP request handlers.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Json,
    extract::{ConnectInfo, Query, State},
    http::{Extensions, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use localprice_types::{
    ConversionError, ConversionRequest, ConversionResponse, ConversionResult, ConvertQuery,
    ExchangeRateProvider, GeolocationProvider,
};

use crate::LocalPriceService;

/// Application state shared across handlers.
pub struct AppState<G, X> {
    pub service: LocalPriceService<G, X>,
    /// Exchange-rate provider key configured on the server. Never taken from callers.
    pub access_key: Option<String>,
}

/// Wrapper to implement IntoResponse for a failed snapshot (orphan rule workaround).
///
/// The body is the full snapshot, so clients can still render the fallback.
pub struct ApiError(pub ConversionResult);

impl ApiError {
    fn status(err: &ConversionError) -> StatusCode {
        match err {
            ConversionError::MissingAccessKey | ConversionError::InvalidAmount(_) => {
                StatusCode::BAD_REQUEST
            }
            ConversionError::Geolocation(_) | ConversionError::ExchangeRate(_) => {
                StatusCode::BAD_GATEWAY
            }
            ConversionError::CurrencyMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self
            .0
            .error
            .as_ref()
            .map(Self::status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(ConversionResponse::from(&self.0))).into_response()
    }
}

/// Address of the viewer: first `X-Forwarded-For` hop, else the peer address.
fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok())
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Convert an amount into the caller's local currency.
#[tracing::instrument(skip_all, fields(amount = query.amount, base = %query.base))]
pub async fn convert<G: GeolocationProvider, X: ExchangeRateProvider>(
    State(state): State<Arc<AppState<G, X>>>,
    headers: HeaderMap,
    extensions: Extensions,
    Query(query): Query<ConvertQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut request = ConversionRequest::new(query.amount, query.base);
    request.access_key = state.access_key.clone();
    request.manual_currency = query.currency;
    request.client_ip = client_ip(&headers, &extensions);

    let result = state.service.convert(&request).await;
    if result.error.is_some() {
        return Err(ApiError(result));
    }
    Ok(Json(ConversionResponse::from(&result)))
}

/// OpenAPI document.
pub async fn openapi() -> impl IntoResponse {
    use utoipa::OpenApi;
    Json(crate::openapi::ApiDoc::openapi())
}
