// =============================================================================
// Regime labels attached to indicator terminal values
// =============================================================================

use serde::{Deserialize, Serialize};

/// Qualitative reading of an indicator's most recent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Oversold,
    Overbought,
    Neutral,
    Bullish,
    Bearish,
    HighVolatility,
    LowVolatility,
    Accumulation,
    Distribution,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oversold => "oversold",
            Self::Overbought => "overbought",
            Self::Neutral => "neutral",
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::HighVolatility => "high_volatility",
            Self::LowVolatility => "low_volatility",
            Self::Accumulation => "accumulation",
            Self::Distribution => "distribution",
        }
    }

    /// Human-readable wording for the report page.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Oversold => "Oversold",
            Self::Overbought => "Overbought",
            Self::Neutral => "Neutral",
            Self::Bullish => "Bullish",
            Self::Bearish => "Bearish",
            Self::HighVolatility => "High Volatility",
            Self::LowVolatility => "Low Volatility",
            Self::Accumulation => "Accumulation",
            Self::Distribution => "Distribution",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared oscillator rule: strictly below `low` is oversold, strictly above
/// `high` is overbought, the closed interval `[low, high]` is neutral.
pub fn classify_band(value: f64, low: f64, high: f64) -> Classification {
    if value < low {
        Classification::Oversold
    } else if value > high {
        Classification::Overbought
    } else {
        Classification::Neutral
    }
}

/// Pure sign test: only a strictly positive value is bullish.
pub fn classify_sign(value: f64) -> Classification {
    if value > 0.0 {
        Classification::Bullish
    } else {
        Classification::Bearish
    }
}
