// =============================================================================
// Stochastic Oscillator (%K)
// =============================================================================
//
//   %K = 100 * (close - LL) / (HH - LL)
//
// where HH / LL are the highest high and lowest low of the last `window`
// periods (current period included). A window with HH == LL has no range;
// %K is pinned to the midpoint 50.

use super::classification::{classify_band, Classification};
use crate::market_data::PricePeriod;

pub const OVERSOLD: f64 = 20.0;
pub const OVERBOUGHT: f64 = 80.0;

/// Most recent %K value.
pub fn calculate_stochastic(periods: &[PricePeriod], window: usize) -> Option<f64> {
    if window == 0 || periods.len() < window {
        return None;
    }

    let recent = &periods[periods.len() - window..];
    let highest = recent.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max);
    let lowest = recent.iter().map(|p| p.low).fold(f64::INFINITY, f64::min);
    let close = recent.last()?.close;

    let range = highest - lowest;
    let k = if range == 0.0 {
        50.0
    } else {
        100.0 * (close - lowest) / range
    };

    k.is_finite().then_some(k)
}

/// `< 20` oversold, `> 80` overbought, otherwise neutral.
pub fn classify(value: f64) -> Classification {
    classify_band(value, OVERSOLD, OVERBOUGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(high: f64, low: f64, close: f64) -> PricePeriod {
        PricePeriod {
            timestamp: 0,
            open: close,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn stochastic_insufficient_data() {
        let periods = vec![period(2.0, 1.0, 1.5); 13];
        assert!(calculate_stochastic(&periods, 14).is_none());
        assert!(calculate_stochastic(&periods, 0).is_none());
    }

    #[test]
    fn stochastic_close_at_high_is_overbought() {
        let mut periods = vec![period(110.0, 90.0, 100.0); 13];
        periods.push(period(120.0, 100.0, 120.0));
        let k = calculate_stochastic(&periods, 14).unwrap();
        assert!((k - 100.0).abs() < 1e-12);
        assert_eq!(classify(k), Classification::Overbought);
    }

    #[test]
    fn stochastic_close_at_low_is_oversold() {
        let mut periods = vec![period(110.0, 90.0, 100.0); 13];
        periods.push(period(95.0, 80.0, 80.0));
        let k = calculate_stochastic(&periods, 14).unwrap();
        assert!(k.abs() < 1e-12);
        assert_eq!(classify(k), Classification::Oversold);
    }

    #[test]
    fn stochastic_only_reads_last_window() {
        let mut periods = vec![period(1000.0, 1.0, 500.0)];
        periods.extend(vec![period(110.0, 90.0, 100.0); 14]);
        let k = calculate_stochastic(&periods, 14).unwrap();
        assert!((k - 50.0).abs() < 1e-12);
    }

    #[test]
    fn stochastic_flat_window_is_neutral() {
        let periods = vec![period(100.0, 100.0, 100.0); 20];
        let k = calculate_stochastic(&periods, 14).unwrap();
        assert_eq!(k, 50.0);
        assert_eq!(classify(k), Classification::Neutral);
    }

    #[test]
    fn classify_boundaries() {
        assert_eq!(classify(20.0), Classification::Neutral);
        assert_eq!(classify(80.0), Classification::Neutral);
    }
}
