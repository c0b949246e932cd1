// =============================================================================
// Report types
// =============================================================================
//
// Everything the engine produces and the presentation layer consumes. A report
// is assembled once per request and never mutated afterwards.
// =============================================================================

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::indicators::Classification;
use crate::types::Interval;

/// The nine indicators of a snapshot, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Rsi,
    Macd,
    Atr,
    Stochastic,
    Obv,
    Ichimoku,
    Bollinger,
    Ema20,
    Sma50,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 9] = [
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::Atr,
        IndicatorKind::Stochastic,
        IndicatorKind::Obv,
        IndicatorKind::Ichimoku,
        IndicatorKind::Bollinger,
        IndicatorKind::Ema20,
        IndicatorKind::Sma50,
    ];

    /// Short identifier, also used in `DegenerateComputation` errors.
    pub fn name(&self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Macd => "macd",
            IndicatorKind::Atr => "atr",
            IndicatorKind::Stochastic => "stochastic",
            IndicatorKind::Obv => "obv",
            IndicatorKind::Ichimoku => "ichimoku",
            IndicatorKind::Bollinger => "bollinger",
            IndicatorKind::Ema20 => "ema20",
            IndicatorKind::Sma50 => "sma50",
        }
    }

    /// Display name for the HTML report.
    pub fn title(&self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Atr => "ATR",
            IndicatorKind::Stochastic => "Stochastic Oscillator",
            IndicatorKind::Obv => "On-Balance Volume",
            IndicatorKind::Ichimoku => "Ichimoku Cloud",
            IndicatorKind::Bollinger => "Bollinger Bands",
            IndicatorKind::Ema20 => "EMA 20",
            IndicatorKind::Sma50 => "SMA 50",
        }
    }

    /// The closed set of labels this indicator may carry.
    pub fn labels(&self) -> &'static [Classification] {
        use Classification::*;
        match self {
            IndicatorKind::Rsi | IndicatorKind::Stochastic | IndicatorKind::Bollinger => {
                &[Oversold, Overbought, Neutral]
            }
            IndicatorKind::Macd
            | IndicatorKind::Ichimoku
            | IndicatorKind::Ema20
            | IndicatorKind::Sma50 => &[Bullish, Bearish],
            IndicatorKind::Atr => &[HighVolatility, LowVolatility],
            IndicatorKind::Obv => &[Accumulation, Distribution],
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Single(f64),
    Band { upper: f64, lower: f64 },
}

impl fmt::Display for IndicatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorValue::Single(v) => write!(f, "{v:.4}"),
            IndicatorValue::Band { upper, lower } => {
                write!(f, "upper {upper:.4} / lower {lower:.4}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub kind: IndicatorKind,
    pub value: IndicatorValue,
    pub classification: Classification,
}

/// Three aligned series for the price chart. Warm-up positions of the moving
/// averages are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRequest {
    pub symbol: String,
    /// Candle interval the series was fetched at; part of the chart file name
    /// when known.
    pub interval: Option<Interval>,
    pub title: String,
    pub closes: Vec<f64>,
    pub ema: Vec<Option<f64>>,
    pub sma: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartArtifact {
    /// File name relative to the static directory, e.g. `BTCUSDT_analysis.svg`.
    pub file_name: String,
    #[serde(skip)]
    pub path: PathBuf,
}

impl ChartArtifact {
    pub fn url(&self) -> String {
        format!("/static/{}", self.file_name)
    }
}

/// Engine result before the chart has been rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub indicators: Vec<IndicatorResult>,
    pub chart: ChartRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub interval: Interval,
    pub generated_at: DateTime<Utc>,
    pub periods: usize,
    pub indicators: Vec<IndicatorResult>,
    pub chart: ChartArtifact,
}

impl AnalysisReport {
    pub fn get(&self, kind: IndicatorKind) -> Option<&IndicatorResult> {
        self.indicators.iter().find(|r| r.kind == kind)
    }
}
