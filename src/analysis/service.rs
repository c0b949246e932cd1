// =============================================================================
// Analysis Service — fetch, ingest, compute, render
// =============================================================================
//
// One call produces one immutable `AnalysisReport`. The CPU-bound part
// (indicator math and chart rendering) runs on the blocking pool so that a
// slow render never stalls the async workers.
// =============================================================================

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument};

use super::engine;
use super::error::{AnalysisError, ErrorKind};
use super::report::AnalysisReport;
use crate::chart::ChartRenderer;
use crate::market_data::{ingest, KlineSource, MAX_KLINE_LIMIT};
use crate::runtime_config::IndicatorParams;
use crate::types::Interval;

/// Failure of a full report request.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("chart rendering failed: {0:#}")]
    Chart(anyhow::Error),

    #[error("analysis task failed: {0}")]
    Internal(String),
}

impl ReportError {
    /// `None` for failures outside the analysis taxonomy.
    pub fn analysis_kind(&self) -> Option<ErrorKind> {
        match self {
            ReportError::Analysis(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Validated request for a single snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub symbol: String,
    pub interval: Interval,
    pub limit: u32,
}

impl AnalysisRequest {
    /// Normalise and validate caller input.
    pub fn new(symbol: &str, interval: Interval, limit: u32) -> Result<Self, AnalysisError> {
        let symbol = crate::types::normalize_symbol(symbol)?;
        if limit == 0 || limit > MAX_KLINE_LIMIT {
            return Err(AnalysisError::InvalidRequest(format!(
                "limit must be between 1 and {MAX_KLINE_LIMIT}, got {limit}"
            )));
        }
        Ok(Self {
            symbol,
            interval,
            limit,
        })
    }
}

/// Run the whole pipeline for `request`.
#[instrument(skip(source, renderer, request, params), fields(symbol = %request.symbol, interval = %request.interval))]
pub async fn run_analysis(
    source: &dyn KlineSource,
    renderer: Arc<dyn ChartRenderer>,
    request: &AnalysisRequest,
    params: &IndicatorParams,
) -> Result<AnalysisReport, ReportError> {
    let records = source
        .fetch_klines(&request.symbol, request.interval, request.limit)
        .await?;
    let series = ingest(&records)?;
    let periods = series.len();

    let symbol = request.symbol.clone();
    let interval = request.interval;
    let params = params.clone();
    let (output, artifact) = tokio::task::spawn_blocking(move || {
        let mut output =
            engine::analyze(&symbol, &series, &params).map_err(ReportError::from)?;
        output.chart.interval = Some(interval);
        let artifact = renderer.render(&output.chart).map_err(ReportError::Chart)?;
        Ok::<_, ReportError>((output, artifact))
    })
    .await
    .map_err(|e| ReportError::Internal(e.to_string()))??;

    info!(
        periods,
        chart = %artifact.file_name,
        "analysis report generated"
    );

    Ok(AnalysisReport {
        symbol: request.symbol.clone(),
        interval: request.interval,
        generated_at: Utc::now(),
        periods,
        indicators: output.indicators,
        chart: artifact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ChartArtifact, ChartRequest, IndicatorKind};
    use crate::chart::SvgChartRenderer;
    use crate::indicators::Classification;
    use crate::market_data::StaticKlineSource;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    fn ramp_records(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                json!([
                    i as i64 * 3_600_000,
                    format!("{c}"),
                    format!("{}", c + 1.0),
                    format!("{}", c - 1.0),
                    format!("{c}"),
                    "25.0",
                    i as i64 * 3_600_000 + 3_599_999
                ])
            })
            .collect()
    }

    struct FailingSource;

    #[async_trait]
    impl KlineSource for FailingSource {
        async fn fetch_klines(
            &self,
            _symbol: &str,
            _interval: Interval,
            _limit: u32,
        ) -> Result<Vec<Value>, AnalysisError> {
            Err(AnalysisError::UpstreamFailure("connection refused".to_string()))
        }
    }

    struct BrokenRenderer;

    impl ChartRenderer for BrokenRenderer {
        fn render(&self, _request: &ChartRequest) -> anyhow::Result<ChartArtifact> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn request_validation() {
        let req = AnalysisRequest::new(" btcusdt ", Interval::OneHour, 100).unwrap();
        assert_eq!(req.symbol, "BTCUSDT");

        assert!(matches!(
            AnalysisRequest::new("BTCUSDT", Interval::OneHour, 0),
            Err(AnalysisError::InvalidRequest(_))
        ));
        assert!(matches!(
            AnalysisRequest::new("BTCUSDT", Interval::OneHour, 1001),
            Err(AnalysisError::InvalidRequest(_))
        ));
        assert!(matches!(
            AnalysisRequest::new("BTC/USDT", Interval::OneHour, 100),
            Err(AnalysisError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn full_pipeline_produces_report_and_chart() {
        let dir = tempfile::tempdir().unwrap();
        let source = StaticKlineSource::new(ramp_records(100));
        let renderer: Arc<dyn ChartRenderer> = Arc::new(SvgChartRenderer::new(dir.path()));
        let req = AnalysisRequest::new("BTCUSDT", Interval::OneHour, 100).unwrap();

        let report = run_analysis(&source, renderer, &req, &IndicatorParams::default())
            .await
            .unwrap();

        assert_eq!(report.symbol, "BTCUSDT");
        assert_eq!(report.periods, 100);
        assert_eq!(report.indicators.len(), 9);
        assert_eq!(
            report.get(IndicatorKind::Rsi).unwrap().classification,
            Classification::Overbought
        );
        assert!(report.chart.path.exists());
        assert_eq!(report.chart.file_name, "BTCUSDT_1h_analysis.svg");
    }

    #[tokio::test]
    async fn intervals_get_separate_charts() {
        let dir = tempfile::tempdir().unwrap();
        let source = StaticKlineSource::new(ramp_records(100));
        let renderer: Arc<dyn ChartRenderer> = Arc::new(SvgChartRenderer::new(dir.path()));
        let params = IndicatorParams::default();

        let hourly = AnalysisRequest::new("BTCUSDT", Interval::OneHour, 100).unwrap();
        let daily = AnalysisRequest::new("BTCUSDT", Interval::OneDay, 100).unwrap();
        let first = run_analysis(&source, renderer.clone(), &hourly, &params)
            .await
            .unwrap();
        let second = run_analysis(&source, renderer, &daily, &params)
            .await
            .unwrap();

        assert_ne!(first.chart.file_name, second.chart.file_name);
        assert!(first.chart.path.exists());
        assert!(second.chart.path.exists());
    }

    #[tokio::test]
    async fn short_history_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = StaticKlineSource::new(ramp_records(51));
        let renderer: Arc<dyn ChartRenderer> = Arc::new(SvgChartRenderer::new(dir.path()));
        let req = AnalysisRequest::new("BTCUSDT", Interval::OneHour, 100).unwrap();

        let err = run_analysis(&source, renderer, &req, &IndicatorParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.analysis_kind(), Some(ErrorKind::InsufficientHistory));
        // Nothing rendered for a rejected series.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn malformed_record_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut records = ramp_records(60);
        records[7] = json!([0, "1", "1", "1", "oops", "1"]);
        let source = StaticKlineSource::new(records);
        let renderer: Arc<dyn ChartRenderer> = Arc::new(SvgChartRenderer::new(dir.path()));
        let req = AnalysisRequest::new("BTCUSDT", Interval::OneHour, 100).unwrap();

        let err = run_analysis(&source, renderer, &req, &IndicatorParams::default())
            .await
            .unwrap_err();
        match err {
            ReportError::Analysis(AnalysisError::MalformedInput { index, field, .. }) => {
                assert_eq!(index, 7);
                assert_eq!(field, "close");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn upstream_and_chart_failures_propagate() {
        let req = AnalysisRequest::new("BTCUSDT", Interval::OneHour, 100).unwrap();
        let params = IndicatorParams::default();

        let err = run_analysis(&FailingSource, Arc::new(BrokenRenderer), &req, &params)
            .await
            .unwrap_err();
        assert_eq!(err.analysis_kind(), Some(ErrorKind::UpstreamFailure));

        let source = StaticKlineSource::new(ramp_records(60));
        let err = run_analysis(&source, Arc::new(BrokenRenderer), &req, &params)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Chart(_)));
        assert!(err.analysis_kind().is_none());
    }
}
