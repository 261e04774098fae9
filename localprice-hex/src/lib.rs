//! # LocalPrice Hex
//!
//! Application service layer and HTTP adapter for local-currency prices.
//!
//! ## Architecture
//!
//! - `cache/` - Shared query cache (freshness windows, single-flight, retry)
//! - `resolver/`, `rates/`, `calculator/` - Pipeline stages
//! - `notifier/` - One-shot success/error callbacks
//! - `service/` - Application service and per-display pipeline instances
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `G: GeolocationProvider` and
//! `X: ExchangeRateProvider`, allowing different adapters to be injected.

pub mod cache;
pub mod calculator;
pub mod inbound;
pub mod notifier;
pub mod openapi;
pub mod rates;
pub mod resolver;
pub mod service;


pub use cache::{CachePolicy, QueryCache, QueryState};
pub use service::{LocalPrice, LocalPriceService};
