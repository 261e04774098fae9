//! # LocalPrice Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Build the geolocation and exchange-rate HTTP adapters
//! - Create the conversion service
//! - Start the HTTP server

mod config;

use std::time::Duration;

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use localprice_client::{ExchangeRateApiClient, IpApiClient};
use localprice_hex::{CachePolicy, LocalPriceService, inbound::HttpServer};

/// How often expired cache entries are evicted.
const PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Viewer locations are cached per address, so the server must forget them.
const GEOLOCATION_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

fn init_tracer() -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("localprice-service"), provider))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize OpenTelemetry tracing
    let (otel_tracer, otel_provider) = init_tracer()?;
    let telemetry = tracing_opentelemetry::layer().with_tracer(otel_tracer);

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,localprice_app=debug,localprice_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting localprice server on port {}", config.port);
    tracing::info!("Geolocation endpoint: {}", config.geolocation_url);
    if config.exchange_rate_api_key.is_none() {
        tracing::warn!("EXCHANGE_RATE_API_KEY is not set; conversions will fail");
    }

    // Create the conversion service
    let service = LocalPriceService::with_policies(
        IpApiClient::new(config.geolocation_url),
        ExchangeRateApiClient::new(config.exchange_rate_url),
        CachePolicy {
            retain_for: Some(GEOLOCATION_RETENTION),
            ..CachePolicy::geolocation()
        },
        CachePolicy::exchange_rates(),
    );

    // Evict expired cache entries in the background
    let purger = service.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = purger.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "evicted expired cache entries");
            }
        }
    });

    // Create and run the HTTP server
    let server = HttpServer::with_rate_limit(
        service,
        config.exchange_rate_api_key,
        config.rate_limit_per_minute,
    );
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    let _ = otel_provider.shutdown();
    Ok(())
}
