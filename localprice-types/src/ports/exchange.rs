//! Exchange rate provider port.
//!
//! This trait defines the interface for exchange rate services.
//! Implementations can be HTTP clients, static tables, mocks, etc.

use crate::domain::{AccessKey, CurrencyCode, RateTable};
use crate::error::ProviderError;

/// Port trait for exchange rate providers.
#[async_trait::async_trait]
pub trait ExchangeRateProvider: Send + Sync + 'static {
    /// Fetches the latest rates for every currency the provider knows,
    /// relative to `base`.
    async fn latest_rates(
        &self,
        access_key: &AccessKey,
        base: &CurrencyCode,
    ) -> Result<RateTable, ProviderError>;
}
