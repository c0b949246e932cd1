// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators in the snapshot
// report. Every public function returns `Option<T>` (or an empty series) so
// callers are forced to handle insufficient-data and numerical-edge-case
// scenarios. Each module also owns the thresholds that turn its terminal value
// into a `Classification`.

pub mod atr;
pub mod bollinger;
pub mod classification;
pub mod ema;
pub mod ichimoku;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use classification::Classification;
