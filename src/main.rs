// =============================================================================
// TA Snapshot — Main Entry Point
// =============================================================================
//
// Serves on-demand technical-analysis snapshots for crypto trading pairs. The
// process is stateless between requests: nothing is persisted except the most
// recent chart image per symbol and interval.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod binance;
mod chart;
mod indicators;
mod market_data;
mod runtime_config;
mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::binance::BinanceClient;
use crate::chart::SvgChartRenderer;
use crate::runtime_config::AnalyzerConfig;

const CONFIG_PATH: &str = "analyzer_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        TA Snapshot — Starting Up                         ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = AnalyzerConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AnalyzerConfig::default()
    });
    config.apply_env_overrides(|key| std::env::var(key).ok());

    info!(symbols = ?config.symbols, "Configured trading pairs");
    info!(
        required_periods = config.indicators.required_periods(),
        kline_limit = config.kline_limit,
        chart_dir = %config.chart_dir.display(),
        "Indicator parameters"
    );
    if config.kline_limit as usize <= config.indicators.required_periods() {
        warn!(
            kline_limit = config.kline_limit,
            required = config.indicators.required_periods(),
            "Default kline limit leaves little or no margin over the required history"
        );
    }

    std::fs::create_dir_all(&config.chart_dir).with_context(|| {
        format!("failed to create chart directory {}", config.chart_dir.display())
    })?;

    // ── 2. Collaborators ─────────────────────────────────────────────────
    let binance_client = BinanceClient::new(
        config.binance_base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let rate_limit = binance_client.rate_limit();
    let renderer = Arc::new(SvgChartRenderer::new(config.chart_dir.clone()));

    // The header value is authoritative, but with no traffic it would never
    // drop back below the hard cap.
    let reset_tracker = rate_limit.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            reset_tracker.reset_1m_weight();
        }
    });

    // ── 3. Shared state ──────────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(
        AppState::new(config, Arc::new(binance_client), renderer).with_rate_limit(rate_limit),
    );

    // ── 4. API server ────────────────────────────────────────────────────
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
