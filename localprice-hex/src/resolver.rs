//! Target-currency resolution: manual override or IP geolocation.

use std::net::IpAddr;
use std::sync::Arc;

use localprice_types::{ConversionError, CurrencyCode, GeolocationProvider, GeolocationRecord};

use crate::cache::QueryCache;

/// Geolocation is cached per viewer address. `None` is the local host.
pub type GeolocationCache = QueryCache<Option<IpAddr>, GeolocationRecord>;

/// Output of the resolution stage for one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub currency: Option<CurrencyCode>,
    pub is_loading: bool,
    pub error: Option<ConversionError>,
}

/// Per-instance resolution state.
///
/// Once a currency is known it is kept, even when a later geolocation refetch
/// fails; only a change of the manual override or of the viewer starts over.
#[derive(Debug, Default)]
pub struct Resolver {
    resolved: Option<CurrencyCode>,
    manual: Option<CurrencyCode>,
    client: Option<IpAddr>,
    mounted: bool,
}

impl Resolver {
    pub fn resolved(&self) -> Option<&CurrencyCode> {
        self.resolved.as_ref()
    }

    /// Makes the next lookup behave like a first observation of the key.
    pub fn remount(&mut self) {
        self.mounted = false;
    }

    /// Resolves the target currency.
    ///
    /// With a manual override the geolocation service is never contacted. When
    /// `enabled` is false (credential check failed) no lookup is issued either.
    pub fn resolve<G: GeolocationProvider>(
        &mut self,
        cache: &GeolocationCache,
        provider: &Arc<G>,
        manual: Option<&CurrencyCode>,
        client: Option<IpAddr>,
        enabled: bool,
    ) -> Resolution {
        if self.manual.as_ref() != manual || self.client != client {
            self.manual = manual.cloned();
            self.client = client;
            self.resolved = None;
            self.mounted = false;
        }

        if let Some(code) = manual {
            self.resolved = Some(code.clone());
            return self.settled(None);
        }
        if !enabled {
            return self.settled(None);
        }

        let mount = !self.mounted;
        self.mounted = true;

        let provider = provider.clone();
        let state = cache.query(&client, mount, move || {
            let provider = provider.clone();
            async move { provider.locate(client).await }
        });

        if let Some(record) = &state.data {
            self.resolved = Some(record.currency.clone());
        }

        Resolution {
            currency: self.resolved.clone(),
            is_loading: state.is_loading(),
            error: state
                .error
                .map(|err| ConversionError::Geolocation(err.to_string())),
        }
    }

    fn settled(&self, error: Option<ConversionError>) -> Resolution {
        Resolution {
            currency: self.resolved.clone(),
            is_loading: false,
            error,
        }
    }
}
