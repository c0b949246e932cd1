// =============================================================================
// Rate-Limit Tracker — keeps kline requests under the Binance weight budget
// =============================================================================
//
// Binance allows 1200 request weight per minute per IP; we hard-cap ourselves
// at 1000. The tracker reads the `X-MBX-USED-WEIGHT-1M` response header after
// every request and keeps an atomic counter that any handler may query
// lock-free.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

/// Hard ceiling at which we refuse to send additional requests.
pub const WEIGHT_HARD_LIMIT: u32 = 1000;
/// Soft warning threshold.
pub const WEIGHT_WARN_THRESHOLD: u32 = 800;

/// Header carrying the weight consumed in the current minute.
const USED_WEIGHT_HEADER: &str = "X-MBX-USED-WEIGHT-1M";

/// Request weight of `/api/v3/klines` for a given `limit`.
pub fn kline_weight(limit: u32) -> u32 {
    match limit {
        0..=99 => 1,
        100..=499 => 2,
        500..=1000 => 5,
        _ => 10,
    }
}

/// Thread-safe rate-limit tracker backed by an atomic counter.
pub struct RateLimitTracker {
    used_weight_1m: AtomicU32,
}

/// Immutable snapshot of the current rate-limit state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub used_weight_1m: u32,
    pub hard_limit: u32,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self {
            used_weight_1m: AtomicU32::new(0),
        }
    }

    // -------------------------------------------------------------------------
    // Header-based updates
    // -------------------------------------------------------------------------

    /// Update the weight counter from the HTTP response headers returned by
    /// Binance.
    pub fn update_from_headers(&self, headers: &reqwest::header::HeaderMap) {
        let Some(weight) = headers
            .get(USED_WEIGHT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok())
        else {
            return;
        };

        let prev = self.used_weight_1m.swap(weight, Ordering::Relaxed);
        if weight >= WEIGHT_WARN_THRESHOLD && prev < WEIGHT_WARN_THRESHOLD {
            warn!(
                used_weight = weight,
                hard_limit = WEIGHT_HARD_LIMIT,
                "rate-limit weight crossed warning threshold"
            );
        } else if weight >= WEIGHT_WARN_THRESHOLD {
            warn!(used_weight = weight, "rate-limit weight remains above warning threshold");
        }
        debug!(used_weight_1m = weight, "rate-limit weight updated from header");
    }

    // -------------------------------------------------------------------------
    // Pre-flight checks
    // -------------------------------------------------------------------------

    /// Return `true` if we can afford to spend `weight` more request weight
    /// without exceeding the hard limit.
    pub fn can_send_request(&self, weight: u32) -> bool {
        let current = self.used_weight_1m.load(Ordering::Relaxed);
        let allowed = current.saturating_add(weight) <= WEIGHT_HARD_LIMIT;
        if !allowed {
            warn!(
                current_weight = current,
                requested_weight = weight,
                hard_limit = WEIGHT_HARD_LIMIT,
                "request blocked, would exceed rate-limit"
            );
        }
        allowed
    }

    /// Reset the 1-minute weight counter (call from a periodic timer).
    pub fn reset_1m_weight(&self) {
        self.used_weight_1m.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        RateLimitSnapshot {
            used_weight_1m: self.used_weight_1m.load(Ordering::Relaxed),
            hard_limit: WEIGHT_HARD_LIMIT,
        }
    }
}

impl Default for RateLimitTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RateLimitTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitTracker")
            .field("used_weight_1m", &self.used_weight_1m.load(Ordering::Relaxed))
            .finish()
    }
}
