// =============================================================================
// HTML form and report page
// =============================================================================
//
// A single page: the symbol / interval form, followed by either the latest
// report, an error message, or nothing. Every dynamic string is escaped.
// =============================================================================

use std::fmt::Write as _;

use crate::analysis::{AnalysisReport, IndicatorValue};
use crate::chart::svg::escape_markup;
use crate::types::Interval;

/// Quote assets recognised when splitting a symbol for display.
const QUOTE_ASSETS: [&str; 6] = ["USDT", "USDC", "FDUSD", "BUSD", "BTC", "ETH"];

/// What to show under the form.
pub enum PageBody<'a> {
    Empty,
    Report(&'a AnalysisReport),
    Error(&'a str),
}

/// `BTCUSDT` -> `BTC/USDT`; symbols without a known quote asset are returned
/// unchanged.
pub fn display_pair(symbol: &str) -> String {
    QUOTE_ASSETS
        .iter()
        .find_map(|quote| {
            symbol
                .strip_suffix(quote)
                .filter(|base| !base.is_empty())
                .map(|base| format!("{base}/{quote}"))
        })
        .unwrap_or_else(|| symbol.to_string())
}

pub fn render_page(
    symbols: &[String],
    selected_symbol: Option<&str>,
    selected_interval: Option<Interval>,
    body: PageBody<'_>,
) -> String {
    let mut html = String::new();

    html.push_str(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Crypto Technical Analysis</title>\n</head>\n<body>\n\
         <h1>Choose a Cryptocurrency</h1>\n<form method=\"post\" action=\"/\">\n",
    );

    // Symbol select.
    html.push_str("<label for=\"symbol\">Symbol:</label>\n<select name=\"symbol\" id=\"symbol\">\n");
    for symbol in symbols {
        let selected = if selected_symbol == Some(symbol.as_str()) { " selected" } else { "" };
        let _ = writeln!(
            html,
            "<option value=\"{}\"{selected}>{}</option>",
            escape_markup(symbol),
            escape_markup(&display_pair(symbol))
        );
    }
    html.push_str("</select>\n");

    // Interval select.
    html.push_str("<label for=\"interval\">Interval:</label>\n<select name=\"interval\" id=\"interval\">\n");
    for (interval, label) in Interval::FORM_CHOICES {
        let selected = if selected_interval == Some(interval) { " selected" } else { "" };
        let _ = writeln!(html, "<option value=\"{interval}\"{selected}>{label}</option>");
    }
    html.push_str("</select>\n<button type=\"submit\">Analyze</button>\n</form>\n");

    match body {
        PageBody::Empty => {}
        PageBody::Error(message) => {
            let _ = writeln!(html, "<p class=\"error\"><b>Error:</b> {}</p>", escape_markup(message));
        }
        PageBody::Report(report) => write_report(&mut html, report),
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn write_report(html: &mut String, report: &AnalysisReport) {
    let _ = writeln!(
        html,
        "<h2>{} - Technical Analysis ({})</h2>",
        escape_markup(&report.symbol),
        report.interval
    );

    for result in &report.indicators {
        let value = match result.value {
            IndicatorValue::Single(v) => format_value(v),
            IndicatorValue::Band { upper, lower } => {
                format!("Upper = {}, Lower = {}", format_value(upper), format_value(lower))
            }
        };
        let _ = writeln!(
            html,
            "<p><b>{}:</b> {} - {}</p>",
            result.kind.title(),
            value,
            result.classification.description()
        );
    }

    let _ = writeln!(
        html,
        "<p><small>{} periods, generated {}</small></p>",
        report.periods,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        html,
        "<h3>Chart:</h3>\n<img src=\"{}\" alt=\"{} chart\">",
        escape_markup(&report.chart.url()),
        escape_markup(&report.symbol)
    );
}

/// Enough precision for sub-cent assets without drowning large prices in
/// decimals.
fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1.0 || value == 0.0 {
        format!("{value:.4}")
    } else {
        format!("{value:.8}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ChartArtifact, IndicatorKind, IndicatorResult};
    use crate::indicators::Classification;
    use chrono::Utc;
    use std::path::PathBuf;

    fn symbols() -> Vec<String> {
        vec!["BTCUSDT".to_string(), "PEPEUSDT".to_string()]
    }

    #[test]
    fn pair_display() {
        assert_eq!(display_pair("BTCUSDT"), "BTC/USDT");
        assert_eq!(display_pair("ETHBTC"), "ETH/BTC");
        assert_eq!(display_pair("USDT"), "USDT");
        assert_eq!(display_pair("XYZ"), "XYZ");
    }

    #[test]
    fn empty_page_has_form_choices() {
        let html = render_page(&symbols(), None, None, PageBody::Empty);
        assert!(html.contains("<option value=\"BTCUSDT\">BTC/USDT</option>"));
        assert!(html.contains("<option value=\"15m\">Day Trading (15 minutes)</option>"));
        assert!(html.contains("<option value=\"1w\">Long-Term (1 week)</option>"));
        assert!(!html.contains("<h2>"));
    }

    #[test]
    fn report_page_lists_indicators_and_chart() {
        let report = AnalysisReport {
            symbol: "PEPEUSDT".to_string(),
            interval: Interval::FourHours,
            generated_at: Utc::now(),
            periods: 100,
            indicators: vec![
                IndicatorResult {
                    kind: IndicatorKind::Rsi,
                    value: IndicatorValue::Single(28.5),
                    classification: Classification::Oversold,
                },
                IndicatorResult {
                    kind: IndicatorKind::Bollinger,
                    value: IndicatorValue::Band {
                        upper: 0.0000125,
                        lower: 0.0000101,
                    },
                    classification: Classification::Neutral,
                },
            ],
            chart: ChartArtifact {
                file_name: "PEPEUSDT_analysis.svg".to_string(),
                path: PathBuf::from("static/PEPEUSDT_analysis.svg"),
            },
        };

        let html = render_page(
            &symbols(),
            Some("PEPEUSDT"),
            Some(Interval::FourHours),
            PageBody::Report(&report),
        );
        assert!(html.contains("<h2>PEPEUSDT - Technical Analysis (4h)</h2>"));
        assert!(html.contains("<b>RSI:</b> 28.5000 - Oversold"));
        assert!(html.contains("Upper = 0.00001250, Lower = 0.00001010"));
        assert!(html.contains("src=\"/static/PEPEUSDT_analysis.svg\""));
        assert!(html.contains("<option value=\"PEPEUSDT\" selected>"));
        assert!(html.contains("<option value=\"4h\" selected>"));
    }

    #[test]
    fn error_message_is_escaped() {
        let html = render_page(&symbols(), None, None, PageBody::Error("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
