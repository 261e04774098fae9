//! LocalPrice CLI
//!
//! Converts a price into the local currency of the machine running it.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exchange_rates::{FixedLocation, StaticRates};
use localprice_client::{
    DEFAULT_EXCHANGE_RATE_URL, DEFAULT_GEOLOCATION_URL, ExchangeRateApiClient, IpApiClient,
};
use localprice_hex::LocalPriceService;
use localprice_types::{
    ConversionRequest, ConversionResponse, ExchangeRateProvider, GeolocationProvider,
    PriceDisplay,
};

#[derive(Parser)]
#[command(name = "localprice")]
#[command(author, version, about = "Show prices in your local currency", long_about = None)]
struct Cli {
    /// Exchange-rate provider access key
    #[arg(long, global = true, env = "EXCHANGE_RATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Use built-in rates and a fixed location instead of the network
    #[arg(long, global = true)]
    offline: bool,

    /// Currency reported by the offline location (offline lookups fail without it)
    #[arg(long, global = true, requires = "offline")]
    location: Option<String>,

    /// IP-geolocation endpoint
    #[arg(long, global = true, env = "GEOLOCATION_URL", default_value = DEFAULT_GEOLOCATION_URL)]
    geolocation_url: String,

    /// Exchange-rate API root
    #[arg(long, global = true, env = "EXCHANGE_RATE_URL", default_value = DEFAULT_EXCHANGE_RATE_URL)]
    exchange_rate_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an amount into the local currency
    Convert {
        /// Amount in the base currency
        amount: f64,
        /// Base currency code
        #[arg(long, default_value = "USD")]
        base: String,
        /// Target currency; skips geolocation
        #[arg(long)]
        currency: Option<String>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the detected location and its currency
    Locate,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.offline {
        let location = match cli.location.as_deref() {
            Some(code) => FixedLocation::new(code),
            None => FixedLocation::unavailable(),
        };
        // Offline rates accept any key
        let access_key = cli.api_key.or_else(|| Some("offline".to_string()));
        let service = LocalPriceService::new(location, StaticRates::new());
        run(service, access_key, cli.command).await
    } else {
        let service = LocalPriceService::new(
            IpApiClient::new(cli.geolocation_url),
            ExchangeRateApiClient::new(cli.exchange_rate_url),
        );
        run(service, cli.api_key, cli.command).await
    }
}

async fn run<G: GeolocationProvider, X: ExchangeRateProvider>(
    service: LocalPriceService<G, X>,
    access_key: Option<String>,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Convert {
            amount,
            base,
            currency,
            json,
        } => {
            let mut request = ConversionRequest::new(amount, base);
            request.access_key = access_key;
            request.manual_currency = currency;

            let result = service.convert(&request).await;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ConversionResponse::from(&result))?
                );
            } else {
                println!("{}", PriceDisplay::from_result(&result, request.base_price));
            }

            if result.error.is_some() {
                std::process::exit(1);
            }
        }

        Commands::Locate => {
            let record = service.locate(None).await?;
            match record.country_code {
                Some(country) => println!("{} ({})", record.currency, country),
                None => println!("{}", record.currency),
            }
        }
    }

    Ok(())
}
