// =============================================================================
// Shared request types used across the TA Snapshot service
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisError;

/// Kline interval accepted by the Binance `/api/v3/klines` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "8h")]
    EightHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
}

impl Interval {
    pub const ALL: [Interval; 15] = [
        Self::OneMinute,
        Self::ThreeMinutes,
        Self::FiveMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::TwoHours,
        Self::FourHours,
        Self::SixHours,
        Self::EightHours,
        Self::TwelveHours,
        Self::OneDay,
        Self::ThreeDays,
        Self::OneWeek,
        Self::OneMonth,
    ];

    /// Intervals offered on the HTML form, with the trading style they suit.
    pub const FORM_CHOICES: [(Interval, &'static str); 5] = [
        (Self::FifteenMinutes, "Day Trading (15 minutes)"),
        (Self::OneHour, "Day Trading (1 hour)"),
        (Self::FourHours, "Swing Trading (4 hours)"),
        (Self::OneDay, "Swing Trading (1 day)"),
        (Self::OneWeek, "Long-Term (1 week)"),
    ];

    /// Wire code used in the Binance query string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::ThreeMinutes => "3m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::TwoHours => "2h",
            Self::FourHours => "4h",
            Self::SixHours => "6h",
            Self::EightHours => "8h",
            Self::TwelveHours => "12h",
            Self::OneDay => "1d",
            Self::ThreeDays => "3d",
            Self::OneWeek => "1w",
            Self::OneMonth => "1M",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Interval {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "1M" (month) and "1m" (minute) differ only by case, so match exactly.
        Self::ALL
            .iter()
            .copied()
            .find(|iv| iv.as_str() == s.trim())
            .ok_or_else(|| AnalysisError::InvalidRequest(format!("unsupported interval '{s}'")))
    }
}

/// Normalise and validate a trading-pair symbol such as `BTCUSDT`.
///
/// The input is trimmed and upper-cased; the result must be 2..=20 ASCII
/// letters or digits.
pub fn normalize_symbol(raw: &str) -> Result<String, AnalysisError> {
    let symbol = raw.trim().to_uppercase();
    let valid = (2..=20).contains(&symbol.len())
        && symbol.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if valid {
        Ok(symbol)
    } else {
        Err(AnalysisError::InvalidRequest(format!("invalid symbol '{raw}'")))
    }
}
