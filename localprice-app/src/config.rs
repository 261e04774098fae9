//! Configuration loading from environment.

use std::env;

use localprice_client::{DEFAULT_EXCHANGE_RATE_URL, DEFAULT_GEOLOCATION_URL};

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    /// Exchange-rate provider key. Requests fail with a credential error while unset.
    pub exchange_rate_api_key: Option<String>,
    pub geolocation_url: String,
    pub exchange_rate_url: String,
    pub rate_limit_per_minute: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = get("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("PORT must be a port number: {}", e))?;

        let rate_limit_per_minute = get("RATE_LIMIT_PER_MINUTE")
            .unwrap_or_else(|| "100".to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("RATE_LIMIT_PER_MINUTE must be a positive integer: {}", e))?;

        let exchange_rate_api_key = get("EXCHANGE_RATE_API_KEY").filter(|k| !k.trim().is_empty());

        Ok(Self {
            port,
            exchange_rate_api_key,
            geolocation_url: get("GEOLOCATION_URL")
                .unwrap_or_else(|| DEFAULT_GEOLOCATION_URL.to_string()),
            exchange_rate_url: get("EXCHANGE_RATE_URL")
                .unwrap_or_else(|| DEFAULT_EXCHANGE_RATE_URL.to_string()),
            rate_limit_per_minute,
        })
    }
}
