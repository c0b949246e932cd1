pub mod series;
pub mod source;

// Re-export the core types for convenient access (e.g. `use crate::market_data::Series`).
pub use series::{ingest, PricePeriod, Series};
pub use source::{KlineSource, MAX_KLINE_LIMIT};
#[cfg(test)]
pub use source::StaticKlineSource;
