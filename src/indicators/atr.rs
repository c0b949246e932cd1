// =============================================================================
// Average True Range (ATR) — Rolling Mean
// =============================================================================
//
// True Range (TR) for each period that has a predecessor:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is the simple arithmetic mean of the last `period` TR values.
//
// Volatility is classified against a configurable threshold, either in
// absolute price units or as a percentage of the latest close.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::classification::Classification;
use crate::market_data::PricePeriod;

/// What the ATR is compared against when classifying volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityBasis {
    /// Raw ATR in quote-currency units.
    Absolute,
    /// ATR / close * 100.
    PercentOfClose,
}

/// Volatility threshold: strictly above `level` is high volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtrThreshold {
    pub basis: VolatilityBasis,
    pub level: f64,
}

impl Default for AtrThreshold {
    fn default() -> Self {
        Self {
            basis: VolatilityBasis::Absolute,
            level: 1.0,
        }
    }
}

impl AtrThreshold {
    pub fn classify(&self, atr: f64, close: f64) -> Classification {
        let metric = match self.basis {
            VolatilityBasis::Absolute => atr,
            VolatilityBasis::PercentOfClose => atr_pct(atr, close).unwrap_or(0.0),
        };
        if metric > self.level {
            Classification::HighVolatility
        } else {
            Classification::LowVolatility
        }
    }
}

/// True Range for every period after the first (length `periods.len() - 1`).
pub fn true_ranges(periods: &[PricePeriod]) -> Vec<f64> {
    periods
        .windows(2)
        .map(|w| {
            let prev_close = w[0].close;
            let cur = &w[1];
            (cur.high - cur.low)
                .max((cur.high - prev_close).abs())
                .max((cur.low - prev_close).abs())
        })
        .collect()
}

/// Compute the most recent ATR value.
///
/// # Returns
/// `None` when:
/// - `period` is zero.
/// - There are fewer than `period + 1` periods (each TR needs a predecessor).
/// - The result is non-finite.
pub fn calculate_atr(periods: &[PricePeriod], period: usize) -> Option<f64> {
    if period == 0 || periods.len() < period + 1 {
        return None;
    }

    let window = &periods[periods.len() - period - 1..];
    let atr = true_ranges(window).iter().sum::<f64>() / period as f64;
    atr.is_finite().then_some(atr)
}

/// ATR as a percentage of `close`; `None` when `close` is zero.
pub fn atr_pct(atr: f64, close: f64) -> Option<f64> {
    if close == 0.0 {
        return None;
    }
    let pct = (atr / close) * 100.0;
    pct.is_finite().then_some(pct)
}
