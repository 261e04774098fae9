//! Domain models for local-currency price conversion.

pub mod access_key;
pub mod currency;
pub mod display;
pub mod rates;
pub mod request;

pub use access_key::AccessKey;
pub use currency::CurrencyCode;
pub use display::PriceDisplay;
pub use rates::{GeolocationRecord, RateTable};
pub use request::{ConversionRequest, ConversionResult, ErrorCallback, SuccessCallback};
