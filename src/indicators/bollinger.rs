// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Middle band = SMA over `period` closes, upper/lower = middle ± k*σ where σ
// is the population standard deviation of the same window. The Band Width
// (BBW) is the normalised distance (upper - lower) / middle * 100.
//
// A close outside the bands reads as a potential reversal: above the upper
// band is overbought, below the lower band is oversold.

use super::classification::Classification;
use super::sma::window_mean;

/// Result of a Bollinger Band calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerResult {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub width: f64,
}

/// Calculate Bollinger Bands over the last `period` closes.
///
/// `width` is 0 when the middle band is zero. Returns `None` when there are
/// fewer than `period` closes or any band is non-finite.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> Option<BollingerResult> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let middle = window_mean(window);

    let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    let upper = middle + num_std * std_dev;
    let lower = middle - num_std * std_dev;
    let width = if middle == 0.0 {
        0.0
    } else {
        (upper - lower) / middle * 100.0
    };

    let bands = BollingerResult {
        upper,
        middle,
        lower,
        width,
    };
    [upper, middle, lower, width]
        .iter()
        .all(|v| v.is_finite())
        .then_some(bands)
}

/// Three-way partition of `close` against the bands.
pub fn classify(close: f64, bands: &BollingerResult) -> Classification {
    if close > bands.upper {
        Classification::Overbought
    } else if close < bands.lower {
        Classification::Oversold
    } else {
        Classification::Neutral
    }
}
