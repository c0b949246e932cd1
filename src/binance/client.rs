// =============================================================================
// Binance REST API Client — public market-data endpoints
// =============================================================================
//
// Only unauthenticated endpoints are used, so no API key is sent. Every
// response feeds the shared rate-limit tracker; a request that would push the
// minute weight past the hard cap is refused locally instead of risking a 429
// or an IP ban.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use super::rate_limit::{kline_weight, RateLimitTracker};
use crate::analysis::AnalysisError;
use crate::market_data::KlineSource;
use crate::types::Interval;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Binance public REST client.
#[derive(Clone)]
pub struct BinanceClient {
    base_url: String,
    client: reqwest::Client,
    rate_limit: Arc<RateLimitTracker>,
}

impl BinanceClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new `BinanceClient`.
    ///
    /// # Arguments
    /// * `base_url`: REST root, e.g. `https://api.binance.com` (no trailing slash).
    /// * `timeout`: applied to every request; there are no retries.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %base_url, timeout_secs = timeout.as_secs(), "BinanceClient initialised");

        Ok(Self {
            base_url,
            client,
            rate_limit: Arc::new(RateLimitTracker::new()),
        })
    }

    pub fn rate_limit(&self) -> Arc<RateLimitTracker> {
        self.rate_limit.clone()
    }

    // -------------------------------------------------------------------------
    // Market data
    // -------------------------------------------------------------------------

    /// GET /api/v3/klines: raw kline arrays, oldest first.
    ///
    /// Array indices:
    ///   [0] openTime, [1] open, [2] high, [3] low, [4] close, [5] volume,
    ///   [6] closeTime, [7] quoteAssetVolume, [8] numberOfTrades,
    ///   [9] takerBuyBaseVolume, [10] takerBuyQuoteVolume
    ///
    /// Field parsing is left to the series ingestor so that a bad record is
    /// reported with its index.
    #[instrument(skip(self), name = "binance::get_klines")]
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: Interval,
        limit: u32,
    ) -> Result<Vec<Value>> {
        let weight = kline_weight(limit);
        if !self.rate_limit.can_send_request(weight) {
            anyhow::bail!(
                "request weight budget exhausted ({} used)",
                self.rate_limit.snapshot().used_weight_1m
            );
        }

        let url = format!("{}/api/v3/klines", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol.to_string()),
                ("interval", interval.as_str().to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await
            .context("GET /api/v3/klines request failed")?;

        self.rate_limit.update_from_headers(resp.headers());

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse klines response")?;

        if !status.is_success() {
            anyhow::bail!("Binance GET /api/v3/klines returned {}: {}", status, body);
        }

        let records = match body {
            Value::Array(records) => records,
            other => anyhow::bail!("klines response is not an array: {other}"),
        };

        debug!(symbol, %interval, count = records.len(), "klines fetched");
        Ok(records)
    }
}

#[async_trait]
impl KlineSource for BinanceClient {
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: Interval,
        limit: u32,
    ) -> Result<Vec<Value>, AnalysisError> {
        self.get_klines(symbol, interval, limit)
            .await
            .map_err(|e| AnalysisError::UpstreamFailure(format!("{e:#}")))
    }
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("base_url", &self.base_url)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn fake_klines(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
        let mut headers = HeaderMap::new();
        headers.insert("X-MBX-USED-WEIGHT-1M", "42".parse().unwrap());

        if params.get("symbol").map(String::as_str) == Some("NOPE") {
            return (
                StatusCode::BAD_REQUEST,
                headers,
                Json(json!({ "code": -1121, "msg": "Invalid symbol." })),
            );
        }

        let limit: usize = params
            .get("limit")
            .and_then(|l| l.parse().ok())
            .unwrap_or(0);
        let rows: Vec<Value> = (0..limit)
            .map(|i| json!([i as i64 * 60_000, "1.0", "2.0", "0.5", "1.5", "10.0", 0]))
            .collect();
        (StatusCode::OK, headers, Json(Value::Array(rows)))
    }

    async fn spawn_fake_binance() -> String {
        let app = Router::new().route("/api/v3/klines", get(fake_klines));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn fetches_klines_and_tracks_weight() {
        let base = spawn_fake_binance().await;
        let client = BinanceClient::new(format!("{base}/"), Duration::from_secs(5)).unwrap();

        let rows = client
            .fetch_klines("BTCUSDT", Interval::OneHour, 3)
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][0], 120_000);
        assert_eq!(client.rate_limit().snapshot().used_weight_1m, 42);
    }

    #[tokio::test]
    async fn error_status_is_upstream_failure() {
        let base = spawn_fake_binance().await;
        let client = BinanceClient::new(base, Duration::from_secs(5)).unwrap();

        let err = client
            .fetch_klines("NOPE", Interval::OneHour, 3)
            .await
            .unwrap_err();
        match err {
            AnalysisError::UpstreamFailure(msg) => assert!(msg.contains("400"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_upstream_failure() {
        let client =
            BinanceClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = client
            .fetch_klines("BTCUSDT", Interval::OneDay, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UpstreamFailure(_)));
    }

    #[tokio::test]
    async fn exhausted_budget_refuses_locally() {
        let client = BinanceClient::new(DEFAULT_BASE_URL, Duration::from_secs(1)).unwrap();
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("X-MBX-USED-WEIGHT-1M", "1000".parse().unwrap());
        client.rate_limit().update_from_headers(&headers);

        let err = client
            .get_klines("BTCUSDT", Interval::OneDay, 100)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("budget"));
    }
}
