//! # LocalPrice Types
//!
//! Domain types and port traits for showing a price in the viewer's local currency.
//! This crate has ZERO external IO dependencies - only data structures,
//! normalization rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (CurrencyCode, AccessKey, RateTable, ConversionResult)
//! - `ports/` - Trait definitions that outbound adapters must implement
//! - `dto/` - Data Transfer Objects for the HTTP boundary
//! - `error/` - Conversion and provider error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    AccessKey, ConversionRequest, ConversionResult, CurrencyCode, ErrorCallback,
    GeolocationRecord, PriceDisplay, RateTable, SuccessCallback,
};
pub use dto::*;
pub use error::{ConversionError, ProviderError};
pub use ports::{ExchangeRateProvider, GeolocationProvider};
