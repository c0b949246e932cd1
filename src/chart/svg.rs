// =============================================================================
// SVG line chart
// =============================================================================
//
// One file per symbol and interval: `<out_dir>/<SYMBOL>_<interval>_analysis.svg`
// (`<SYMBOL>_analysis.svg` when the interval is unknown). A new render for the
// same pair replaces the previous file. Monthly charts use `1mo` so they never
// collide with `1m` on a case-insensitive filesystem. The document is written to a
// uniquely named temp file in the same directory and renamed into place, so
// concurrent renders never leave a half-written chart behind.
// =============================================================================

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use uuid::Uuid;

use super::ChartRenderer;
use crate::analysis::{ChartArtifact, ChartRequest};
use crate::types::Interval;

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
const Y_TICKS: usize = 5;

const CLOSE_COLOR: &str = "#1f77b4";
const EMA_COLOR: &str = "orange";
const SMA_COLOR: &str = "green";

#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
    out_dir: PathBuf,
}

impl SvgChartRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, request: &ChartRequest) -> Result<ChartArtifact> {
        std::fs::create_dir_all(&self.out_dir).with_context(|| {
            format!("failed to create chart directory {}", self.out_dir.display())
        })?;

        let file_name = chart_file_name(&request.symbol, request.interval);
        let path = self.out_dir.join(&file_name);
        let tmp_path = self
            .out_dir
            .join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        let document = render_document(request);

        std::fs::write(&tmp_path, document.as_bytes())
            .with_context(|| format!("failed to write chart to {}", tmp_path.display()))?;

        if let Err(e) = std::fs::rename(&tmp_path, &path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e).with_context(|| format!("failed to move chart to {}", path.display()));
        }

        debug!(symbol = %request.symbol, path = %path.display(), "chart rendered");
        Ok(ChartArtifact { file_name, path })
    }
}

fn chart_file_name(symbol: &str, interval: Option<Interval>) -> String {
    match interval {
        Some(Interval::OneMonth) => format!("{symbol}_1mo_analysis.svg"),
        Some(interval) => format!("{symbol}_{}_analysis.svg", interval.as_str()),
        None => format!("{symbol}_analysis.svg"),
    }
}

/// Escape the five XML/HTML special characters.
pub fn escape_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

// =============================================================================
// Layout
// =============================================================================

/// Maps (index, price) onto the plot area.
struct Frame {
    len: usize,
    min: f64,
    max: f64,
}

impl Frame {
    fn new(request: &ChartRequest) -> Self {
        let (min, max) = request
            .closes
            .iter()
            .copied()
            .chain(request.ema.iter().flatten().copied())
            .chain(request.sma.iter().flatten().copied())
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        let (min, max) = if !min.is_finite() {
            (0.0, 1.0)
        } else if max - min == 0.0 {
            // Flat series: give it a visible band around the price.
            let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.01 };
            (min - pad, max + pad)
        } else {
            (min, max)
        };

        Self {
            len: request.closes.len(),
            min,
            max,
        }
    }

    fn plot_width() -> f64 {
        WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height() -> f64 {
        HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn x(&self, index: usize) -> f64 {
        if self.len <= 1 {
            return MARGIN_LEFT + Self::plot_width() / 2.0;
        }
        MARGIN_LEFT + Self::plot_width() * index as f64 / (self.len - 1) as f64
    }

    fn y(&self, value: f64) -> f64 {
        MARGIN_TOP + Self::plot_height() * (self.max - value) / (self.max - self.min)
    }
}

fn render_document(request: &ChartRequest) -> String {
    let frame = Frame::new(request);
    let mut svg = String::new();

    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);

    // Title and axis labels.
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="30" font-size="18" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        escape_markup(&request.title)
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="14" text-anchor="middle">Time</text>"#,
        MARGIN_LEFT + Frame::plot_width() / 2.0,
        HEIGHT - 15.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{y}" font-size="14" text-anchor="middle" transform="rotate(-90 20 {y})">Price</text>"#,
        y = MARGIN_TOP + Frame::plot_height() / 2.0
    );

    // Axes and horizontal grid.
    let _ = writeln!(
        svg,
        r#"<rect x="{MARGIN_LEFT}" y="{MARGIN_TOP}" width="{}" height="{}" fill="none" stroke="black"/>"#,
        Frame::plot_width(),
        Frame::plot_height()
    );
    for tick in 0..=Y_TICKS {
        let value = frame.min + (frame.max - frame.min) * tick as f64 / Y_TICKS as f64;
        let y = frame.y(value);
        let _ = writeln!(
            svg,
            r##"<line x1="{MARGIN_LEFT}" y1="{y:.2}" x2="{}" y2="{y:.2}" stroke="#dddddd"/>"##,
            WIDTH - MARGIN_RIGHT
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{:.2}" font-size="11" text-anchor="end">{}</text>"#,
            MARGIN_LEFT - 6.0,
            y + 4.0,
            format_price(value)
        );
    }

    // Series.
    let closes: Vec<Option<f64>> = request.closes.iter().copied().map(Some).collect();
    write_polyline(&mut svg, &frame, &closes, CLOSE_COLOR, "close");
    write_polyline(&mut svg, &frame, &request.ema, EMA_COLOR, "ema");
    write_polyline(&mut svg, &frame, &request.sma, SMA_COLOR, "sma");

    // Legend.
    let legend = [
        (CLOSE_COLOR, "Close Price"),
        (EMA_COLOR, "EMA 20"),
        (SMA_COLOR, "SMA 50"),
    ];
    for (i, (color, label)) in legend.iter().enumerate() {
        let y = MARGIN_TOP + 20.0 + i as f64 * 18.0;
        let x = MARGIN_LEFT + 12.0;
        let _ = writeln!(
            svg,
            r#"<line x1="{x}" y1="{y}" x2="{}" y2="{y}" stroke="{color}" stroke-width="2"/>"#,
            x + 24.0
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="12">{label}</text>"#,
            x + 30.0,
            y + 4.0
        );
    }

    svg.push_str("</svg>\n");
    svg
}

/// One polyline per contiguous run of defined points.
fn write_polyline(svg: &mut String, frame: &Frame, values: &[Option<f64>], color: &str, id: &str) {
    let mut runs: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for (i, value) in values.iter().enumerate() {
        match value.filter(|v| v.is_finite()) {
            Some(v) => current.push(format!("{:.2},{:.2}", frame.x(i), frame.y(v))),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    for points in runs {
        let _ = writeln!(
            svg,
            r#"<polyline class="{id}" fill="none" stroke="{color}" stroke-width="1.5" points="{}"/>"#,
            points.join(" ")
        );
    }
}

fn format_price(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1000.0 {
        format!("{value:.0}")
    } else if magnitude >= 1.0 {
        format!("{value:.2}")
    } else {
        format!("{value:.6}")
    }
}
