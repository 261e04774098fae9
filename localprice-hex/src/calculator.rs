//! Rate lookup and price conversion.

use localprice_types::{ConversionError, CurrencyCode, RateTable};

/// Looks up `currency` in a fetched table.
///
/// A missing code is a [`ConversionError::CurrencyMismatch`]: the fetch worked,
/// the provider just does not publish a rate for it.
pub fn find_rate(table: &RateTable, currency: &CurrencyCode) -> Result<f64, ConversionError> {
    table
        .rate_for(currency)
        .ok_or_else(|| ConversionError::CurrencyMismatch(currency.clone()))
}

/// Rounds half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Converts `base_price` at `rate`. Zero and negative prices are valid.
pub fn convert(base_price: f64, rate: f64) -> f64 {
    round2(base_price * rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_rounds_to_cents() {
        assert_eq!(convert(100.0, 0.88), 88.0);
        assert_eq!(convert(10.0, 1.23456), 12.35);
        assert_eq!(convert(1.0, 0.125), 0.13);
    }

    #[test]
    fn test_convert_zero_and_negative() {
        assert_eq!(convert(0.0, 0.88), 0.0);
        assert_eq!(convert(-10.0, 1.5), -15.0);
        assert_eq!(convert(-1.0, 0.125), -0.13);
    }

    #[test]
    fn test_find_rate() {
        let table = RateTable::from_pairs("USD", [("EUR", 0.88)]);
        assert_eq!(find_rate(&table, &CurrencyCode::from("eur")), Ok(0.88));
        assert_eq!(
            find_rate(&table, &CurrencyCode::from("XYZ")),
            Err(ConversionError::CurrencyMismatch(CurrencyCode::from("XYZ")))
        );
    }
}
