//! Port traits (interfaces for adapters).
//!
//! These are the contracts that outbound adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod exchange;
mod geolocation;

pub use exchange::ExchangeRateProvider;
pub use geolocation::GeolocationProvider;
