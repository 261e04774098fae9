//! Exchange-rate table fetching, gated on a resolved target currency.

use std::sync::Arc;

use localprice_types::{AccessKey, ConversionError, CurrencyCode, ExchangeRateProvider, RateTable};

use crate::cache::{QueryCache, QueryState};

/// Rates are cached per `(base, target)` pair so that a change of either refetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RatesKey {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
}

pub type RateCache = QueryCache<RatesKey, RateTable>;

/// Output of the rate stage for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct RatesStage {
    pub table: Option<RateTable>,
    pub is_loading: bool,
    pub error: Option<ConversionError>,
}

impl From<QueryState<RateTable>> for RatesStage {
    fn from(state: QueryState<RateTable>) -> Self {
        Self {
            is_loading: state.is_loading(),
            table: state.data,
            error: state
                .error
                .map(|err| ConversionError::ExchangeRate(err.to_string())),
        }
    }
}

/// Per-instance fetcher state: the last key this instance observed.
#[derive(Debug, Default)]
pub struct RateFetcher {
    observed: Option<RatesKey>,
}

impl RateFetcher {
    /// Makes the next fetch behave like a first observation of the key.
    pub fn remount(&mut self) {
        self.observed = None;
    }

    /// Fetches the table for `base`, or does nothing while `target` is unknown.
    pub fn fetch<X: ExchangeRateProvider>(
        &mut self,
        cache: &RateCache,
        provider: &Arc<X>,
        access_key: &AccessKey,
        base: &CurrencyCode,
        target: Option<&CurrencyCode>,
    ) -> RatesStage {
        let Some(target) = target else {
            return RatesStage::default();
        };

        let key = RatesKey {
            base: base.clone(),
            target: target.clone(),
        };
        let mount = self.observed.as_ref() != Some(&key);
        self.observed = Some(key.clone());

        let provider = provider.clone();
        let access_key = access_key.clone();
        let base = base.clone();
        cache
            .query(&key, mount, move || {
                let provider = provider.clone();
                let access_key = access_key.clone();
                let base = base.clone();
                async move { provider.latest_rates(&access_key, &base).await }
            })
            .into()
    }
}
