//! Local Price Application Service
//!
//! Orchestrates currency resolution, rate fetching and conversion through the
//! provider ports. Contains NO infrastructure logic - pure orchestration over a
//! shared query cache.

use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::watch;

use localprice_types::{
    AccessKey, ConversionError, ConversionRequest, ConversionResult, CurrencyCode,
    ExchangeRateProvider, GeolocationProvider, GeolocationRecord,
};

use crate::cache::CachePolicy;
use crate::calculator::{convert, find_rate};
use crate::notifier::Notifier;
use crate::rates::{RateCache, RateFetcher};
use crate::resolver::{GeolocationCache, Resolver};

/// Application service for local-currency prices.
///
/// Generic over the two provider ports - the adapters are injected at compile time.
/// One service is shared by any number of [`LocalPrice`] instances; they all go
/// through the same caches, so identical keys are fetched once.
pub struct LocalPriceService<G, X> {
    geolocation: Arc<G>,
    rates: Arc<X>,
    geolocation_cache: GeolocationCache,
    rate_cache: RateCache,
    revision: Arc<watch::Sender<u64>>,
}

impl<G, X> Clone for LocalPriceService<G, X> {
    fn clone(&self) -> Self {
        Self {
            geolocation: self.geolocation.clone(),
            rates: self.rates.clone(),
            geolocation_cache: self.geolocation_cache.clone(),
            rate_cache: self.rate_cache.clone(),
            revision: self.revision.clone(),
        }
    }
}

impl<G: GeolocationProvider, X: ExchangeRateProvider> LocalPriceService<G, X> {
    /// Creates a service with the default cache policies.
    pub fn new(geolocation: G, rates: X) -> Self {
        Self::with_policies(
            geolocation,
            rates,
            CachePolicy::geolocation(),
            CachePolicy::exchange_rates(),
        )
    }

    /// Creates a service with custom cache policies.
    pub fn with_policies(
        geolocation: G,
        rates: X,
        geolocation_policy: CachePolicy,
        rate_policy: CachePolicy,
    ) -> Self {
        let revision = Arc::new(watch::channel(0).0);
        Self {
            geolocation: Arc::new(geolocation),
            rates: Arc::new(rates),
            geolocation_cache: GeolocationCache::new(geolocation_policy, revision.clone()),
            rate_cache: RateCache::new(rate_policy, revision.clone()),
            revision,
        }
    }

    /// Creates a new pipeline instance, e.g. one per displayed price.
    pub fn instance(&self) -> LocalPrice<G, X> {
        LocalPrice {
            service: self.clone(),
            inputs: None,
            resolver: Resolver::default(),
            fetcher: RateFetcher::default(),
            notifier: Notifier::default(),
        }
    }

    /// Runs a fresh instance until `request` settles.
    #[tracing::instrument(skip(self), fields(base = %request.base_currency))]
    pub async fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        self.instance().settle(request).await
    }

    /// Looks up a location directly, bypassing the cache.
    pub async fn locate(
        &self,
        client: Option<IpAddr>,
    ) -> Result<GeolocationRecord, ConversionError> {
        self.geolocation
            .locate(client)
            .await
            .map_err(|err| ConversionError::Geolocation(err.to_string()))
    }

    /// Subscribes to cache completions.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn geolocation_cache(&self) -> &GeolocationCache {
        &self.geolocation_cache
    }

    pub fn rate_cache(&self) -> &RateCache {
        &self.rate_cache
    }

    /// Evicts expired entries from both caches.
    pub fn purge_expired(&self) -> usize {
        self.geolocation_cache.purge_expired() + self.rate_cache.purge_expired()
    }
}

/// Normalized request inputs. A change here starts a fresh outcome.
#[derive(Debug, Clone, PartialEq)]
struct Inputs {
    base_price: f64,
    base_currency: CurrencyCode,
    manual_currency: Option<CurrencyCode>,
    access_key: Option<String>,
    client_ip: Option<IpAddr>,
}

impl From<&ConversionRequest> for Inputs {
    fn from(req: &ConversionRequest) -> Self {
        Self {
            base_price: req.base_price,
            base_currency: CurrencyCode::normalize(&req.base_currency),
            manual_currency: CurrencyCode::normalize_optional(req.manual_currency.as_deref()),
            access_key: req.access_key.clone(),
            client_ip: req.client_ip,
        }
    }
}

/// One conversion pipeline instance.
///
/// Holds the per-instance state (resolved currency, last notified outcome) and
/// can be re-evaluated any number of times; repeated evaluation with unchanged
/// inputs issues no new fetches while cached data is fresh and fires no
/// duplicate callbacks.
pub struct LocalPrice<G, X> {
    service: LocalPriceService<G, X>,
    inputs: Option<Inputs>,
    resolver: Resolver,
    fetcher: RateFetcher,
    notifier: Notifier,
}

impl<G: GeolocationProvider, X: ExchangeRateProvider> LocalPrice<G, X> {
    /// Re-evaluates the pipeline against the current cache contents.
    ///
    /// Never blocks: missing data is requested in the background and reported as
    /// loading. Must be called from within a Tokio runtime.
    pub fn evaluate(&mut self, request: &ConversionRequest) -> ConversionResult {
        let inputs = Inputs::from(request);
        if self.inputs.as_ref() != Some(&inputs) {
            tracing::debug!(
                base = %inputs.base_currency,
                manual = ?inputs.manual_currency,
                "inputs changed"
            );
            self.notifier.reset();
            self.resolver.remount();
            self.fetcher.remount();
            self.inputs = Some(inputs.clone());
        }
        self.notifier
            .set_callbacks(request.on_success.clone(), request.on_error.clone());

        let result = self.aggregate(&inputs);
        self.notifier.notify(&result);
        result
    }

    /// Re-evaluates on every cache completion until the snapshot settles.
    pub async fn settle(&mut self, request: &ConversionRequest) -> ConversionResult {
        let mut changes = self.service.subscribe();
        loop {
            changes.mark_unchanged();
            let result = self.evaluate(request);
            if result.is_settled() || changes.changed().await.is_err() {
                return result;
            }
        }
    }

    /// The currency this instance has resolved so far.
    pub fn resolved_currency(&self) -> Option<&CurrencyCode> {
        self.resolver.resolved()
    }

    fn aggregate(&mut self, inputs: &Inputs) -> ConversionResult {
        let service = &self.service;
        let base_currency = inputs.base_currency.clone();

        let validated = AccessKey::parse(inputs.access_key.as_deref()).and_then(|key| {
            if inputs.base_price.is_finite() {
                Ok(key)
            } else {
                Err(ConversionError::InvalidAmount(inputs.base_price))
            }
        });
        let access_key = match validated {
            Ok(key) => key,
            Err(err) => {
                let resolution = self.resolver.resolve(
                    &service.geolocation_cache,
                    &service.geolocation,
                    inputs.manual_currency.as_ref(),
                    inputs.client_ip,
                    false,
                );
                return ConversionResult::failed(base_currency, resolution.currency, err);
            }
        };

        let resolution = self.resolver.resolve(
            &service.geolocation_cache,
            &service.geolocation,
            inputs.manual_currency.as_ref(),
            inputs.client_ip,
            true,
        );
        let rates = self.fetcher.fetch(
            &service.rate_cache,
            &service.rates,
            &access_key,
            &base_currency,
            resolution.currency.as_ref(),
        );

        let is_loading =
            resolution.is_loading || (resolution.currency.is_some() && rates.is_loading);

        let lookup = match (&rates.table, &resolution.currency) {
            (Some(table), Some(currency)) => Some(find_rate(table, currency)),
            _ => None,
        };
        let exchange_rate = lookup.as_ref().and_then(|found| found.as_ref().ok().copied());
        let error = resolution
            .error
            .or(rates.error)
            .or_else(|| lookup.and_then(Result::err));

        let converted_price = match (is_loading, &error, exchange_rate) {
            (false, None, Some(rate)) => Some(convert(inputs.base_price, rate)),
            _ => None,
        };

        ConversionResult {
            converted_price,
            local_currency: resolution.currency,
            base_currency,
            exchange_rate,
            is_loading,
            error,
        }
    }
}
