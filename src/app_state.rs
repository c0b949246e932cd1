// =============================================================================
// Central Application State
// =============================================================================
//
// Shared by every request handler via `Arc<AppState>`. Configuration is
// read-only after startup; the only mutable parts are atomic counters used by
// the health endpoint.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::binance::rate_limit::{RateLimitSnapshot, RateLimitTracker};
use crate::chart::ChartRenderer;
use crate::market_data::KlineSource;
use crate::runtime_config::AnalyzerConfig;

pub struct AppState {
    // ── Configuration ───────────────────────────────────────────────────
    pub config: AnalyzerConfig,

    // ── Collaborators ───────────────────────────────────────────────────
    pub source: Arc<dyn KlineSource>,
    pub renderer: Arc<dyn ChartRenderer>,
    /// Present when the source is the Binance client.
    pub rate_limit: Option<Arc<RateLimitTracker>>,

    // ── Counters ────────────────────────────────────────────────────────
    reports_generated: AtomicU64,
    reports_failed: AtomicU64,

    /// Instant when the server was started. Used for uptime calculations.
    pub start_time: Instant,
}

/// Counters reported by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub uptime_secs: u64,
    pub reports_generated: u64,
    pub reports_failed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitSnapshot>,
}

impl AppState {
    pub fn new(
        config: AnalyzerConfig,
        source: Arc<dyn KlineSource>,
        renderer: Arc<dyn ChartRenderer>,
    ) -> Self {
        Self {
            config,
            source,
            renderer,
            rate_limit: None,
            reports_generated: AtomicU64::new(0),
            reports_failed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn with_rate_limit(mut self, tracker: Arc<RateLimitTracker>) -> Self {
        self.rate_limit = Some(tracker);
        self
    }

    pub fn record_success(&self) {
        self.reports_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.reports_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn usage(&self) -> UsageSnapshot {
        UsageSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            reports_generated: self.reports_generated.load(Ordering::Relaxed),
            reports_failed: self.reports_failed.load(Ordering::Relaxed),
            rate_limit: self.rate_limit.as_ref().map(|t| t.snapshot()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::SvgChartRenderer;
    use crate::market_data::StaticKlineSource;

    #[test]
    fn counters_accumulate() {
        let state = AppState::new(
            AnalyzerConfig::default(),
            Arc::new(StaticKlineSource::default()),
            Arc::new(SvgChartRenderer::new("static")),
        );
        state.record_success();
        state.record_success();
        state.record_failure();

        let usage = state.usage();
        assert_eq!(usage.reports_generated, 2);
        assert_eq!(usage.reports_failed, 1);
        assert!(usage.rate_limit.is_none());

        let state = state.with_rate_limit(Arc::new(RateLimitTracker::new()));
        assert_eq!(state.usage().rate_limit.unwrap().used_weight_1m, 0);
    }
}
