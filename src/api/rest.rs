// =============================================================================
// HTTP API — Axum 0.7
// =============================================================================
//
// JSON endpoints live under `/api/v1/`. The root path serves the HTML form and
// report page; rendered charts are served from `/static`.
//
// CORS is configured permissively; the service is read-only and holds no
// credentials.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::analysis::{run_analysis, AnalysisError, AnalysisReport, AnalysisRequest, ReportError};
use crate::api::html::{render_page, PageBody};
use crate::app_state::{AppState, UsageSnapshot};
use crate::types::Interval;

/// Interval used when the JSON caller does not pass one.
const DEFAULT_INTERVAL: Interval = Interval::OneHour;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full router with CORS middleware, static chart serving and
/// shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let charts = ServeDir::new(&state.config.chart_dir);

    Router::new()
        // ── HTML ────────────────────────────────────────────────────
        .route("/", get(index_page).post(submit_form))
        // ── JSON ────────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/analysis", get(analysis))
        // ── Rendered charts ─────────────────────────────────────────
        .nest_service("/static", charts)
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Error mapping
// =============================================================================

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<crate::analysis::ErrorKind>,
}

fn status_for(err: &ReportError) -> StatusCode {
    match err {
        ReportError::Analysis(e) => match e {
            AnalysisError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AnalysisError::InsufficientHistory { .. }
            | AnalysisError::DegenerateComputation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AnalysisError::UpstreamFailure(_) | AnalysisError::MalformedInput { .. } => {
                StatusCode::BAD_GATEWAY
            }
        },
        ReportError::Chart(_) | ReportError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error response.
struct ApiError(ReportError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.0.analysis_kind(),
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Shared request path
// =============================================================================

async fn generate_report(
    state: &AppState,
    symbol: &str,
    interval: Interval,
    limit: Option<u32>,
) -> Result<AnalysisReport, ReportError> {
    let limit = limit.unwrap_or(state.config.kline_limit);
    let request = AnalysisRequest::new(symbol, interval, limit)?;

    let result = run_analysis(
        state.source.as_ref(),
        state.renderer.clone(),
        &request,
        &state.config.indicators,
    )
    .await;

    match &result {
        Ok(report) => {
            state.record_success();
            info!(symbol = %report.symbol, interval = %report.interval, "report served");
        }
        Err(e) => {
            state.record_failure();
            warn!(symbol, %interval, error = %e, "report request failed");
        }
    }
    result
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
    #[serde(flatten)]
    usage: UsageSnapshot,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
        usage: state.usage(),
    };
    Json(resp)
}

// =============================================================================
// JSON analysis
// =============================================================================

/// Query parameters are taken as strings so that every validation failure
/// produces the same JSON error body.
#[derive(Debug, Deserialize)]
struct AnalysisQuery {
    symbol: Option<String>,
    interval: Option<String>,
    limit: Option<String>,
}

async fn analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let symbol = query
        .symbol
        .ok_or_else(|| invalid("missing 'symbol' query parameter"))?;

    let interval = match query.interval.as_deref() {
        Some(raw) => raw.parse::<Interval>().map_err(ReportError::from).map_err(ApiError)?,
        None => DEFAULT_INTERVAL,
    };

    let limit = query
        .limit
        .as_deref()
        .map(|raw| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| invalid(&format!("limit '{raw}' is not a positive integer")))
        })
        .transpose()?;

    let report = generate_report(&state, &symbol, interval, limit)
        .await
        .map_err(ApiError)?;
    Ok(Json(report))
}

fn invalid(message: &str) -> ApiError {
    ApiError(AnalysisError::InvalidRequest(message.to_string()).into())
}

// =============================================================================
// HTML form
// =============================================================================

#[derive(Debug, Deserialize)]
struct AnalyzeForm {
    symbol: String,
    interval: String,
}

async fn index_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(&state.config.symbols, None, None, PageBody::Empty))
}

async fn submit_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AnalyzeForm>,
) -> (StatusCode, Html<String>) {
    let symbols = &state.config.symbols;

    let interval = match form.interval.parse::<Interval>() {
        Ok(interval) => interval,
        Err(e) => {
            let message = e.to_string();
            let page = render_page(symbols, Some(&form.symbol), None, PageBody::Error(&message));
            return (StatusCode::BAD_REQUEST, Html(page));
        }
    };

    match generate_report(&state, &form.symbol, interval, None).await {
        Ok(report) => {
            let page = render_page(
                symbols,
                Some(&report.symbol),
                Some(interval),
                PageBody::Report(&report),
            );
            (StatusCode::OK, Html(page))
        }
        Err(e) => {
            let message = e.to_string();
            let page = render_page(
                symbols,
                Some(&form.symbol),
                Some(interval),
                PageBody::Error(&message),
            );
            (status_for(&e), Html(page))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartRenderer, SvgChartRenderer};
    use crate::market_data::{KlineSource, StaticKlineSource};
    use crate::runtime_config::AnalyzerConfig;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct DownSource;

    #[async_trait]
    impl KlineSource for DownSource {
        async fn fetch_klines(
            &self,
            _symbol: &str,
            _interval: Interval,
            _limit: u32,
        ) -> Result<Vec<Value>, AnalysisError> {
            Err(AnalysisError::UpstreamFailure("timed out".to_string()))
        }
    }

    fn records(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                json!([i as i64 * 60_000, c, c + 1.0, c - 1.0, c, 10.0])
            })
            .collect()
    }

    fn app_with(source: Arc<dyn KlineSource>, dir: &std::path::Path) -> Router {
        let config = AnalyzerConfig {
            chart_dir: dir.to_path_buf(),
            ..AnalyzerConfig::default()
        };
        let renderer: Arc<dyn ChartRenderer> = Arc::new(SvgChartRenderer::new(dir));
        router(Arc::new(AppState::new(config, source, renderer)))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let (status, bytes) = get(app, uri).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(Arc::new(StaticKlineSource::default()), dir.path());
        let (status, body) = get_json(app, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["server_time"].as_i64().unwrap() > 0);
        assert_eq!(body["reports_generated"], 0);
    }

    #[tokio::test]
    async fn analysis_returns_full_report() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(Arc::new(StaticKlineSource::new(records(100))), dir.path());
        let (status, body) =
            get_json(app, "/api/v1/analysis?symbol=btcusdt&interval=4h&limit=100").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "BTCUSDT");
        assert_eq!(body["interval"], "4h");
        assert_eq!(body["periods"], 100);
        assert_eq!(body["indicators"].as_array().unwrap().len(), 9);
        assert_eq!(body["indicators"][0]["kind"], "rsi");
        assert!(body["indicators"][6]["value"]["upper"].is_f64());
        assert_eq!(body["chart"]["file_name"], "BTCUSDT_4h_analysis.svg");
    }

    #[tokio::test]
    async fn short_history_is_422() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(Arc::new(StaticKlineSource::new(records(51))), dir.path());
        let (status, body) = get_json(app, "/api/v1/analysis?symbol=BTCUSDT").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "insufficient_history");
    }

    #[tokio::test]
    async fn bad_input_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let source: Arc<dyn KlineSource> = Arc::new(StaticKlineSource::new(records(100)));

        for uri in [
            "/api/v1/analysis?symbol=BTC%2FUSDT",
            "/api/v1/analysis",
            "/api/v1/analysis?symbol=BTCUSDT&interval=7m",
            "/api/v1/analysis?symbol=BTCUSDT&limit=abc",
            "/api/v1/analysis?symbol=BTCUSDT&limit=5000",
        ] {
            let (status, body) = get_json(app_with(source.clone(), dir.path()), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["kind"], "invalid_request", "{uri}");
        }
    }

    #[tokio::test]
    async fn upstream_failure_is_502() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(Arc::new(DownSource), dir.path());
        let (status, body) = get_json(app, "/api/v1/analysis?symbol=ETHUSDT").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "upstream_failure");
    }

    #[tokio::test]
    async fn index_page_renders_form() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(Arc::new(StaticKlineSource::default()), dir.path());
        let (status, body) = get(app, "/").await;
        let html = String::from_utf8(body).unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<form method=\"post\""));
        assert!(html.contains("DOGE/USDT"));
    }

    #[tokio::test]
    async fn form_submission_renders_report_and_serves_chart() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(Arc::new(StaticKlineSource::new(records(100))), dir.path());

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("symbol=ETHUSDT&interval=1d"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = String::from_utf8(
            to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec(),
        )
        .unwrap();
        assert!(html.contains("ETHUSDT - Technical Analysis (1d)"));
        assert!(html.contains("<b>RSI:</b>"));

        let (status, svg) = get(app, "/static/ETHUSDT_1d_analysis.svg").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(svg).unwrap().starts_with("<svg"));
    }

    #[tokio::test]
    async fn form_error_is_shown_on_page() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with(Arc::new(StaticKlineSource::new(records(10))), dir.path());

        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("symbol=BTCUSDT&interval=15m"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = String::from_utf8(
            to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec(),
        )
        .unwrap();
        assert!(html.contains("class=\"error\""));
        assert!(html.contains("insufficient data"));
    }
}
