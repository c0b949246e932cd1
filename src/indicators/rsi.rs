// =============================================================================
// RSI (Wilder)
// =============================================================================
//
// Gains and losses are the positive and negative parts of close-to-close
// changes. Their averages start as plain means over the first `period`
// changes, then follow Wilder's recurrence:
//
//   avg_t = (avg_{t-1} * (period - 1) + x_t) / period
//   RSI   = 100 - 100 / (1 + avg_gain / avg_loss)
//
// No movement at all reads as 50; gains with no losses read as 100.
// =============================================================================

use super::classification::{classify_band, Classification};

pub const OVERSOLD: f64 = 30.0;
pub const OVERBOUGHT: f64 = 70.0;

/// RSI series for `closes`, one value per close from index `period` on.
///
/// Empty when `period` is zero or fewer than `period` changes exist. A
/// non-finite value stops the series early.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() <= period {
        return Vec::new();
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let (seed, rest) = changes.split_at(period);

    let mut avg = WilderAverages::seed(seed);
    let mut result = Vec::with_capacity(rest.len() + 1);

    for next in std::iter::once(None).chain(rest.iter().copied().map(Some)) {
        if let Some(change) = next {
            avg.push(change, period);
        }
        match avg.rsi() {
            Some(rsi) => result.push(rsi),
            None => break,
        }
    }

    result
}

/// Most recent RSI value together with its classification.
///
/// Returns `None` when there is insufficient data or the calculation produces
/// a non-finite result.
pub fn current_rsi(closes: &[f64], period: usize) -> Option<(f64, Classification)> {
    let series = calculate_rsi(closes, period);
    // A truncated series means a non-finite value appeared before the end.
    if series.len() != closes.len().saturating_sub(period) {
        return None;
    }
    let value = *series.last()?;
    Some((value, classify(value)))
}

/// `< 30` oversold, `> 70` overbought, `[30, 70]` neutral.
pub fn classify(value: f64) -> Classification {
    classify_band(value, OVERSOLD, OVERBOUGHT)
}

// =============================================================================
// Internal helpers
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct WilderAverages {
    gain: f64,
    loss: f64,
}

impl WilderAverages {
    fn seed(changes: &[f64]) -> Self {
        let n = changes.len() as f64;
        let gain = changes.iter().map(|c| c.max(0.0)).sum::<f64>() / n;
        let loss = changes.iter().map(|c| (-c).max(0.0)).sum::<f64>() / n;
        Self { gain, loss }
    }

    fn push(&mut self, change: f64, period: usize) {
        let keep = (period - 1) as f64;
        let n = period as f64;
        self.gain = (self.gain * keep + change.max(0.0)) / n;
        self.loss = (self.loss * keep + (-change).max(0.0)) / n;
    }

    fn rsi(&self) -> Option<f64> {
        let rsi = match (self.gain == 0.0, self.loss == 0.0) {
            (true, true) => 50.0,
            (_, true) => 100.0,
            _ => 100.0 - 100.0 / (1.0 + self.gain / self.loss),
        };
        rsi.is_finite().then_some(rsi)
    }
}
