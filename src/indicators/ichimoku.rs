// =============================================================================
// Ichimoku Cloud
// =============================================================================
//
//   Conversion (Tenkan) = midpoint of HH/LL over `conversion` periods
//   Base (Kijun)        = midpoint of HH/LL over `base` periods
//   Span A              = (Conversion + Base) / 2
//   Span B              = midpoint of HH/LL over `span_b` periods
//
// Spans are evaluated at the last period without the forward displacement used
// for plotting. Span B needs the longest history of every indicator in the
// report (52 periods by default).

use super::classification::Classification;
use crate::market_data::PricePeriod;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IchimokuResult {
    pub conversion: f64,
    pub base: f64,
    pub span_a: f64,
    pub span_b: f64,
}

impl IchimokuResult {
    /// Signed cloud thickness; positive when span A is on top.
    pub fn cloud(&self) -> f64 {
        self.span_a - self.span_b
    }

    pub fn cloud_top(&self) -> f64 {
        self.span_a.max(self.span_b)
    }
}

pub fn calculate_ichimoku(
    periods: &[PricePeriod],
    conversion: usize,
    base: usize,
    span_b: usize,
) -> Option<IchimokuResult> {
    let longest = conversion.max(base).max(span_b);
    if conversion == 0 || base == 0 || span_b == 0 || periods.len() < longest {
        return None;
    }

    let conversion_line = midpoint(periods, conversion)?;
    let base_line = midpoint(periods, base)?;
    let result = IchimokuResult {
        conversion: conversion_line,
        base: base_line,
        span_a: (conversion_line + base_line) / 2.0,
        span_b: midpoint(periods, span_b)?,
    };

    (result.span_a.is_finite() && result.span_b.is_finite()).then_some(result)
}

/// Close strictly above the whole cloud is bullish.
pub fn classify(close: f64, cloud: &IchimokuResult) -> Classification {
    if close > cloud.cloud_top() {
        Classification::Bullish
    } else {
        Classification::Bearish
    }
}

/// (highest high + lowest low) / 2 over the last `window` periods.
fn midpoint(periods: &[PricePeriod], window: usize) -> Option<f64> {
    let recent = periods.get(periods.len().checked_sub(window)?..)?;
    let highest = recent.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max);
    let lowest = recent.iter().map(|p| p.low).fold(f64::INFINITY, f64::min);
    Some((highest + lowest) / 2.0)
}
