// =============================================================================
// Runtime Configuration — service settings and indicator parameters
// =============================================================================
//
// Every tunable lives here: where to listen, where market data comes from,
// where charts are written, and the lookback windows / thresholds of each
// indicator.
//
// The file is read once at startup and never written back. All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file. Window lengths are checked on load: a zero window would fail
// every request, so such a file is rejected as a whole.
//
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::atr::AtrThreshold;
use crate::indicators::macd;

/// Shortest history the engine ever accepts; Ichimoku span B needs 52 periods.
pub const MIN_ANALYSIS_PERIODS: usize = 52;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_binance_base_url() -> String {
    crate::binance::client::DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_kline_limit() -> u32 {
    100
}

fn default_chart_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_symbols() -> Vec<String> {
    vec![
        "BTCUSDT".to_string(),
        "ETHUSDT".to_string(),
        "DOGEUSDT".to_string(),
        "PEPEUSDT".to_string(),
    ]
}

fn default_rsi_period() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_atr_period() -> usize {
    14
}

fn default_stochastic_window() -> usize {
    14
}

fn default_ichimoku_conversion() -> usize {
    9
}

fn default_ichimoku_base() -> usize {
    26
}

fn default_ichimoku_span_b() -> usize {
    52
}

fn default_bollinger_window() -> usize {
    20
}

fn default_bollinger_std() -> f64 {
    2.0
}

fn default_ema_window() -> usize {
    20
}

fn default_sma_window() -> usize {
    50
}

// =============================================================================
// IndicatorParams
// =============================================================================

/// Lookback windows and thresholds for every indicator in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// Volatility threshold. The default (absolute, 1.0) is not scale-aware;
    /// switch `basis` to `percent_of_close` for mixed-magnitude symbol lists.
    #[serde(default)]
    pub atr_threshold: AtrThreshold,

    #[serde(default = "default_stochastic_window")]
    pub stochastic_window: usize,

    #[serde(default = "default_ichimoku_conversion")]
    pub ichimoku_conversion: usize,

    #[serde(default = "default_ichimoku_base")]
    pub ichimoku_base: usize,

    #[serde(default = "default_ichimoku_span_b")]
    pub ichimoku_span_b: usize,

    #[serde(default = "default_bollinger_window")]
    pub bollinger_window: usize,

    /// Band half-width in standard deviations.
    #[serde(default = "default_bollinger_std")]
    pub bollinger_std: f64,

    #[serde(default = "default_ema_window")]
    pub ema_window: usize,

    #[serde(default = "default_sma_window")]
    pub sma_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            atr_period: default_atr_period(),
            atr_threshold: AtrThreshold::default(),
            stochastic_window: default_stochastic_window(),
            ichimoku_conversion: default_ichimoku_conversion(),
            ichimoku_base: default_ichimoku_base(),
            ichimoku_span_b: default_ichimoku_span_b(),
            bollinger_window: default_bollinger_window(),
            bollinger_std: default_bollinger_std(),
            ema_window: default_ema_window(),
            sma_window: default_sma_window(),
        }
    }
}

impl IndicatorParams {
    /// Number of periods a series needs before any indicator is computed.
    ///
    /// Never less than [`MIN_ANALYSIS_PERIODS`]; grows when a configured
    /// window needs more history.
    pub fn required_periods(&self) -> usize {
        [
            MIN_ANALYSIS_PERIODS,
            self.rsi_period + 1,
            macd::min_closes(self.macd_fast, self.macd_slow, self.macd_signal),
            self.atr_period + 1,
            self.stochastic_window,
            self.ichimoku_conversion,
            self.ichimoku_base,
            self.ichimoku_span_b,
            self.bollinger_window,
            self.ema_window,
            self.sma_window,
            2, // OBV compares the last two values
        ]
        .into_iter()
        .max()
        .unwrap_or(MIN_ANALYSIS_PERIODS)
    }

    /// Reject windows and multipliers no indicator can be computed with.
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("atr_period", self.atr_period),
            ("stochastic_window", self.stochastic_window),
            ("ichimoku_conversion", self.ichimoku_conversion),
            ("ichimoku_base", self.ichimoku_base),
            ("ichimoku_span_b", self.ichimoku_span_b),
            ("bollinger_window", self.bollinger_window),
            ("ema_window", self.ema_window),
            ("sma_window", self.sma_window),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, w)| *w == 0) {
            anyhow::bail!("indicator window `{name}` must be at least 1");
        }
        if !self.bollinger_std.is_finite() || self.bollinger_std < 0.0 {
            anyhow::bail!(
                "bollinger_std must be a non-negative number, got {}",
                self.bollinger_std
            );
        }
        if !self.atr_threshold.level.is_finite() {
            anyhow::bail!("atr_threshold.level must be finite");
        }
        Ok(())
    }
}

// =============================================================================
// AnalyzerConfig
// =============================================================================

/// Top-level configuration for the snapshot service.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    // --- Server -------------------------------------------------------------

    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Directory rendered charts are written to and served from.
    #[serde(default = "default_chart_dir")]
    pub chart_dir: PathBuf,

    /// Symbols offered on the HTML form.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    // --- Market data --------------------------------------------------------

    #[serde(default = "default_binance_base_url")]
    pub binance_base_url: String,

    /// Timeout for a single kline request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Candles requested when the caller does not specify a limit.
    #[serde(default = "default_kline_limit")]
    pub kline_limit: u32,

    // --- Indicators ---------------------------------------------------------

    #[serde(default)]
    pub indicators: IndicatorParams,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            chart_dir: default_chart_dir(),
            symbols: default_symbols(),
            binance_base_url: default_binance_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            kline_limit: default_kline_limit(),
            indicators: IndicatorParams::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analyzer config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse analyzer config from {}", path.display()))?;
        config
            .indicators
            .validate()
            .with_context(|| format!("invalid indicator parameters in {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = ?config.symbols,
            required_periods = config.indicators.required_periods(),
            "analyzer config loaded"
        );

        Ok(config)
    }

    /// Apply environment overrides (`TA_BIND_ADDR`, `TA_SYMBOLS`,
    /// `TA_CHART_DIR`, `BINANCE_BASE_URL`) on top of the loaded file.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("TA_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(syms) = lookup("TA_SYMBOLS") {
            let parsed: Vec<String> = syms
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.symbols = parsed;
            }
        }
        if let Some(dir) = lookup("TA_CHART_DIR") {
            self.chart_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("BINANCE_BASE_URL") {
            self.binance_base_url = url.trim_end_matches('/').to_string();
        }
    }
}
