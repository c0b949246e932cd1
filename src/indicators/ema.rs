// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   k     = 2 / (period + 1)
//   EMA_0 = close_0
//   EMA_t = close_t * k + EMA_{t-1} * (1 - k)
//
// The step is evaluated as EMA_{t-1} + k * (close_t - EMA_{t-1}) so that a
// constant input stays exactly constant.
//
// The recurrence starts at the very first close. Values before index
// `period - 1` are still warming up and are masked as `None` in the public
// series.
// =============================================================================

use super::classification::Classification;

/// Run the raw EMA recurrence over every input value.
///
/// The output has the same length as `values`. Returns an empty `Vec` when
/// `period` is zero or the input is empty.
pub fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.is_empty() {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len());
    let mut prev = values[0];
    result.push(prev);

    for &value in &values[1..] {
        prev += k * (value - prev);
        result.push(prev);
    }

    result
}

/// Compute the EMA series aligned with `values`, with the first
/// `period - 1` warm-up positions set to `None`.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `values.len() < period` => empty vec
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    ema_values(values, period)
        .into_iter()
        .enumerate()
        .map(|(i, v)| if i + 1 >= period { Some(v) } else { None })
        .collect()
}

/// Most recent EMA value, or `None` on insufficient data or a non-finite result.
pub fn current_ema(values: &[f64], period: usize) -> Option<f64> {
    let value = calculate_ema(values, period).last().copied().flatten()?;
    value.is_finite().then_some(value)
}

/// Moving-average crossover: a fast EMA strictly above the slow SMA is bullish.
pub fn classify_crossover(ema: f64, sma: f64) -> Classification {
    if ema > sma {
        Classification::Bullish
    } else {
        Classification::Bearish
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: build a simple ascending price series.
    fn ascending(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
        assert!(ema_values(&[], 5).is_empty());
    }

    #[test]
    fn ema_period_zero() {
        assert!(calculate_ema(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn ema_insufficient_data() {
        assert!(calculate_ema(&[1.0, 2.0], 5).is_empty());
        assert!(current_ema(&[1.0, 2.0], 5).is_none());
    }

    #[test]
    fn ema_is_seeded_with_first_value() {
        let raw = ema_values(&[10.0, 20.0], 3);
        // k = 0.5 => 20 * 0.5 + 10 * 0.5 = 15
        assert_eq!(raw, vec![10.0, 15.0]);
    }

    #[test]
    fn ema_warm_up_is_masked() {
        let series = calculate_ema(&ascending(10), 4);
        assert_eq!(series.len(), 10);
        assert!(series[..3].iter().all(Option::is_none));
        assert!(series[3..].iter().all(Option::is_some));
    }

    #[test]
    fn ema_known_values() {
        let closes = ascending(10);
        let k = 2.0 / 6.0;
        let mut expected = closes[0];
        for &c in &closes[1..] {
            expected = c * k + expected * (1.0 - k);
        }
        let got = current_ema(&closes, 5).unwrap();
        assert!((got - expected).abs() < 1e-10, "got {got}, expected {expected}");
    }

    #[test]
    fn ema_flat_series_stays_flat() {
        let closes = vec![42.0; 30];
        let got = current_ema(&closes, 20).unwrap();
        assert!((got - 42.0).abs() < 1e-12);
    }

    #[test]
    fn ema_lags_rising_prices() {
        let closes = ascending(60);
        let got = current_ema(&closes, 20).unwrap();
        assert!(got < 60.0);
        assert!(got > 45.0);
    }

    #[test]
    fn crossover_labels() {
        assert_eq!(classify_crossover(101.0, 100.0), Classification::Bullish);
        assert_eq!(classify_crossover(100.0, 100.0), Classification::Bearish);
        assert_eq!(classify_crossover(99.0, 100.0), Classification::Bearish);
    }
}
