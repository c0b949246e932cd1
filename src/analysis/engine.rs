// =============================================================================
// Indicator Engine
// =============================================================================
//
// Series -> nine (value, classification) pairs plus the chart series.
//
// The engine is a pure function: no I/O, no shared state, and identical input
// always yields identical output. The length gate runs before anything is
// computed; a short series is rejected as a whole rather than producing a
// partial report.
//
// Indicator order in the output is fixed (see `IndicatorKind::ALL`).
// =============================================================================

use tracing::debug;

use super::error::AnalysisError;
use super::report::{ChartRequest, EngineOutput, IndicatorKind, IndicatorResult, IndicatorValue};
use crate::indicators::{
    atr, bollinger, ema, ichimoku, macd, obv, rsi, sma, stochastic, Classification,
};
use crate::market_data::Series;
use crate::runtime_config::IndicatorParams;

/// Compute every indicator for `series`.
///
/// # Errors
/// - `InsufficientHistory` when `series` is shorter than
///   `params.required_periods()`.
/// - `DegenerateComputation` when an indicator yields a non-finite value.
pub fn analyze(
    symbol: &str,
    series: &Series,
    params: &IndicatorParams,
) -> Result<EngineOutput, AnalysisError> {
    let required = params.required_periods();
    if series.len() < required {
        return Err(AnalysisError::InsufficientHistory {
            required,
            available: series.len(),
        });
    }

    let periods = series.periods();
    let closes = series.closes();
    let volumes = series.volumes();
    let last_close = series
        .last()
        .map(|p| p.close)
        .ok_or(AnalysisError::InsufficientHistory {
            required,
            available: 0,
        })?;

    let mut indicators = Vec::with_capacity(IndicatorKind::ALL.len());

    // --- Momentum ---------------------------------------------------------
    let (rsi_value, rsi_label) =
        rsi::current_rsi(&closes, params.rsi_period).ok_or_else(|| degenerate(IndicatorKind::Rsi))?;
    indicators.push(single(IndicatorKind::Rsi, rsi_value, rsi_label));

    let macd_result = macd::calculate_macd(
        &closes,
        params.macd_fast,
        params.macd_slow,
        params.macd_signal,
    )
    .ok_or_else(|| degenerate(IndicatorKind::Macd))?;
    indicators.push(single(
        IndicatorKind::Macd,
        macd_result.histogram,
        macd::classify(macd_result.histogram),
    ));

    // --- Volatility -------------------------------------------------------
    let atr_value = atr::calculate_atr(periods, params.atr_period)
        .ok_or_else(|| degenerate(IndicatorKind::Atr))?;
    indicators.push(single(
        IndicatorKind::Atr,
        atr_value,
        params.atr_threshold.classify(atr_value, last_close),
    ));

    let stoch = stochastic::calculate_stochastic(periods, params.stochastic_window)
        .ok_or_else(|| degenerate(IndicatorKind::Stochastic))?;
    indicators.push(single(
        IndicatorKind::Stochastic,
        stoch,
        stochastic::classify(stoch),
    ));

    // --- Volume -----------------------------------------------------------
    let (obv_last, obv_prev) =
        obv::current_obv(&closes, &volumes).ok_or_else(|| degenerate(IndicatorKind::Obv))?;
    indicators.push(single(
        IndicatorKind::Obv,
        obv_last,
        obv::classify(obv_last, obv_prev),
    ));

    // --- Trend ------------------------------------------------------------
    let cloud = ichimoku::calculate_ichimoku(
        periods,
        params.ichimoku_conversion,
        params.ichimoku_base,
        params.ichimoku_span_b,
    )
    .ok_or_else(|| degenerate(IndicatorKind::Ichimoku))?;
    // The value is the cloud thickness (span A - span B) while the label is the
    // close against the cloud top, so a positive value can still read bearish.
    indicators.push(single(
        IndicatorKind::Ichimoku,
        cloud.cloud(),
        ichimoku::classify(last_close, &cloud),
    ));

    let bands = bollinger::calculate_bollinger(&closes, params.bollinger_window, params.bollinger_std)
        .ok_or_else(|| degenerate(IndicatorKind::Bollinger))?;
    indicators.push(IndicatorResult {
        kind: IndicatorKind::Bollinger,
        value: IndicatorValue::Band {
            upper: bands.upper,
            lower: bands.lower,
        },
        classification: bollinger::classify(last_close, &bands),
    });

    let ema_series = ema::calculate_ema(&closes, params.ema_window);
    let sma_series = sma::calculate_sma(&closes, params.sma_window);

    let ema_value = ema_series
        .last()
        .copied()
        .flatten()
        .filter(|v| v.is_finite())
        .ok_or_else(|| degenerate(IndicatorKind::Ema20))?;
    let sma_value = sma::current_sma(&closes, params.sma_window)
        .ok_or_else(|| degenerate(IndicatorKind::Sma50))?;

    // Both moving averages carry the same crossover reading.
    let crossover = ema::classify_crossover(ema_value, sma_value);
    indicators.push(single(IndicatorKind::Ema20, ema_value, crossover));
    indicators.push(single(IndicatorKind::Sma50, sma_value, crossover));

    debug!(
        symbol,
        periods = series.len(),
        rsi = rsi_value,
        macd_hist = macd_result.histogram,
        atr = atr_value,
        "indicators computed"
    );

    let chart = ChartRequest {
        symbol: symbol.to_string(),
        interval: None,
        title: format!("{symbol} - Technical Analysis"),
        closes,
        ema: ema_series,
        sma: sma_series,
    };

    Ok(EngineOutput { indicators, chart })
}

fn single(kind: IndicatorKind, value: f64, classification: Classification) -> IndicatorResult {
    IndicatorResult {
        kind,
        value: IndicatorValue::Single(value),
        classification,
    }
}

fn degenerate(kind: IndicatorKind) -> AnalysisError {
    AnalysisError::DegenerateComputation {
        indicator: kind.name(),
    }
}
