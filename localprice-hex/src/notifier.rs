//! One-shot success/error notification.
//!
//! A pipeline instance is re-evaluated many times per settled outcome, and each
//! evaluation may hand over freshly allocated callbacks. The notifier remembers
//! which kinds of outcome it has already reported for the current inputs (not the
//! callbacks it reported to) and always dispatches through the most recent callbacks.

use localprice_types::{ConversionResult, ErrorCallback, SuccessCallback};

#[derive(Default)]
pub struct Notifier {
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
    success_fired: bool,
    error_fired: bool,
}

impl Notifier {
    /// Replaces the callbacks with the ones supplied by the latest evaluation.
    pub fn set_callbacks(
        &mut self,
        on_success: Option<SuccessCallback>,
        on_error: Option<ErrorCallback>,
    ) {
        self.on_success = on_success;
        self.on_error = on_error;
    }

    /// Forgets what was reported. Called when the inputs change.
    pub fn reset(&mut self) {
        self.success_fired = false;
        self.error_fired = false;
    }

    /// Reports `result` the first time the inputs settle with a success, and the
    /// first time they settle with an error. Returns whether a notification was dispatched.
    pub fn notify(&mut self, result: &ConversionResult) -> bool {
        if result.is_loading {
            return false;
        }

        match &result.error {
            Some(err) => {
                if self.error_fired {
                    return false;
                }
                self.error_fired = true;
                tracing::info!(kind = err.kind(), error = %err, "conversion failed");
                if let Some(on_error) = &self.on_error {
                    on_error(err);
                }
            }
            None => {
                if self.success_fired || result.converted_price.is_none() {
                    return false;
                }
                self.success_fired = true;
                tracing::info!(
                    converted_price = ?result.converted_price,
                    local_currency = ?result.local_currency,
                    "conversion settled"
                );
                if let Some(on_success) = &self.on_success {
                    on_success(result);
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localprice_types::{ConversionError, CurrencyCode};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn success(price: f64) -> ConversionResult {
        ConversionResult {
            converted_price: Some(price),
            local_currency: Some(CurrencyCode::from("EUR")),
            base_currency: CurrencyCode::from("USD"),
            exchange_rate: Some(0.88),
            is_loading: false,
            error: None,
        }
    }

    fn counter() -> (Arc<AtomicUsize>, SuccessCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        (
            count,
            Arc::new(move |_: &ConversionResult| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_loading_is_never_reported() {
        let mut notifier = Notifier::default();
        let loading = ConversionResult {
            is_loading: true,
            converted_price: None,
            ..success(1.0)
        };
        assert!(!notifier.notify(&loading));
    }

    #[test]
    fn test_same_outcome_reported_once() {
        let mut notifier = Notifier::default();
        let (count, _) = counter();
        for _ in 0..5 {
            let hits = count.clone();
            notifier.set_callbacks(
                Some(Arc::new(move |_: &ConversionResult| {
                    hits.fetch_add(1, Ordering::SeqCst);
                })),
                None,
            );
            notifier.notify(&success(88.0));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_latest_callback_wins() {
        let mut notifier = Notifier::default();
        let (stale, stale_cb) = counter();
        let (fresh, fresh_cb) = counter();

        notifier.set_callbacks(Some(stale_cb), None);
        notifier.set_callbacks(Some(fresh_cb), None);
        notifier.notify(&success(88.0));

        assert_eq!(stale.load(Ordering::SeqCst), 0);
        assert_eq!(fresh.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_success_reported_once_per_inputs() {
        let mut notifier = Notifier::default();
        let (count, cb) = counter();
        notifier.set_callbacks(Some(cb), None);

        assert!(notifier.notify(&success(88.0)));
        assert!(!notifier.notify(&success(90.0)));
        notifier.reset();
        assert!(notifier.notify(&success(88.0)));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_success_not_repeated_after_error() {
        let mut notifier = Notifier::default();
        let (count, cb) = counter();
        notifier.set_callbacks(Some(cb), None);
        let failed = ConversionResult::failed(
            CurrencyCode::from("USD"),
            Some(CurrencyCode::from("EUR")),
            ConversionError::Geolocation("quota".into()),
        );

        assert!(notifier.notify(&success(88.0)));
        assert!(notifier.notify(&failed));
        assert!(!notifier.notify(&success(88.0)));
        assert!(!notifier.notify(&failed));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_reported_once() {
        let mut notifier = Notifier::default();
        let errors = Arc::new(AtomicUsize::new(0));
        let hits = errors.clone();
        notifier.set_callbacks(
            None,
            Some(Arc::new(move |_: &ConversionError| {
                hits.fetch_add(1, Ordering::SeqCst);
            })),
        );
        let failed = ConversionResult::failed(
            CurrencyCode::from("USD"),
            None,
            ConversionError::MissingAccessKey,
        );
        notifier.notify(&failed);
        notifier.notify(&failed);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }
}
