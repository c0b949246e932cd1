// =============================================================================
// Kline source abstraction
// =============================================================================
//
// Anything that can hand back raw candle records for a symbol/interval. The
// Binance REST client is the production implementation; tests plug in
// in-memory sources.
// =============================================================================

use async_trait::async_trait;
use serde_json::Value;

use crate::analysis::AnalysisError;
use crate::types::Interval;

/// Largest `limit` Binance accepts on `/api/v3/klines`.
pub const MAX_KLINE_LIMIT: u32 = 1000;

#[async_trait]
pub trait KlineSource: Send + Sync {
    /// Fetch up to `limit` raw kline records, oldest first.
    ///
    /// Network failures and unexpected response shapes surface as
    /// `AnalysisError::UpstreamFailure`.
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: Interval,
        limit: u32,
    ) -> Result<Vec<Value>, AnalysisError>;
}

/// Fixed in-memory source.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct StaticKlineSource {
    records: Vec<Value>,
}

#[cfg(test)]
impl StaticKlineSource {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }
}

#[cfg(test)]
#[async_trait]
impl KlineSource for StaticKlineSource {
    async fn fetch_klines(
        &self,
        _symbol: &str,
        _interval: Interval,
        limit: u32,
    ) -> Result<Vec<Value>, AnalysisError> {
        // Mirror the exchange: the most recent `limit` records.
        let skip = self.records.len().saturating_sub(limit as usize);
        Ok(self.records[skip..].to_vec())
    }
}
