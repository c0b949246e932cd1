// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   MACD line = EMA(fast) - EMA(slow)
//   Signal    = EMA(signal) of the MACD line
//   Histogram = MACD line - Signal   ("macd_diff")
//
// Both price EMAs run from the first close. The MACD line only exists once the
// slow EMA has warmed up, and the signal recurrence is seeded with the first
// MACD value. The histogram is available after a further `signal - 1` bars.
// =============================================================================

use super::classification::{classify_sign, Classification};
use super::ema::ema_values;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdResult {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Minimum closes needed for one histogram value.
pub fn min_closes(fast: usize, slow: usize, signal: usize) -> usize {
    (fast.max(slow) + signal).saturating_sub(1)
}

/// Compute the terminal MACD, signal and histogram values.
///
/// Returns `None` when any period is zero, there are too few closes, or the
/// result is non-finite.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdResult> {
    if fast == 0 || slow == 0 || signal == 0 || closes.len() < min_closes(fast, slow, signal) {
        return None;
    }

    let fast_ema = ema_values(closes, fast);
    let slow_ema = ema_values(closes, slow);

    let start = fast.max(slow) - 1;
    let macd_line: Vec<f64> = (start..closes.len())
        .map(|i| fast_ema[i] - slow_ema[i])
        .collect();

    let signal_line = ema_values(&macd_line, signal);

    let macd = *macd_line.last()?;
    let signal = *signal_line.last()?;
    let histogram = macd - signal;

    histogram.is_finite().then_some(MacdResult {
        macd,
        signal,
        histogram,
    })
}

/// Histogram sign test: `> 0` bullish, anything else (zero included) bearish.
pub fn classify(histogram: f64) -> Classification {
    classify_sign(histogram)
}
