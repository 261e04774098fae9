//! IP-geolocation port.

use std::net::IpAddr;

use crate::domain::GeolocationRecord;
use crate::error::ProviderError;

/// Port trait for services that map the caller's IP address to a local currency.
#[async_trait::async_trait]
pub trait GeolocationProvider: Send + Sync + 'static {
    /// Looks up the location of `client`, or of the calling host when `None`.
    async fn locate(&self, client: Option<IpAddr>) -> Result<GeolocationRecord, ProviderError>;
}
