use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::analysis::AnalysisError;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePeriod {
    /// Period open time, milliseconds since the UNIX epoch.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Ordered OHLCV history, oldest first.
///
/// The series is never mutated after ingestion; length policy is enforced by
/// the indicator engine, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    periods: Vec<PricePeriod>,
}

impl Series {
    pub fn new(periods: Vec<PricePeriod>) -> Self {
        Self { periods }
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn periods(&self) -> &[PricePeriod] {
        &self.periods
    }

    pub fn last(&self) -> Option<&PricePeriod> {
        self.periods.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.volume).collect()
    }
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Binance kline array layout: `[openTime, open, high, low, close, volume, ...]`.
const ARRAY_FIELDS: [(&str, usize); 6] = [
    ("timestamp", 0),
    ("open", 1),
    ("high", 2),
    ("low", 3),
    ("close", 4),
    ("volume", 5),
];

/// Normalise raw candle records into a [`Series`].
///
/// Each record is either a Binance kline array or an object with
/// `timestamp` (or `open_time`), `open`, `high`, `low`, `close` and `volume`
/// keys. Numeric fields may arrive as JSON strings or numbers.
///
/// A single malformed record fails the whole ingestion.
pub fn ingest(records: &[Value]) -> Result<Series, AnalysisError> {
    let mut periods = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let period = match record {
            Value::Array(arr) => parse_array_record(index, arr)?,
            Value::Object(_) => parse_object_record(index, record)?,
            _ => {
                return Err(AnalysisError::malformed(
                    index,
                    "record",
                    "expected an array or object",
                ))
            }
        };
        periods.push(period);
    }

    debug!(count = periods.len(), "raw candles ingested");
    Ok(Series::new(periods))
}

fn parse_array_record(index: usize, arr: &[Value]) -> Result<PricePeriod, AnalysisError> {
    let [ts, open, high, low, close, volume] = ARRAY_FIELDS;
    Ok(PricePeriod {
        timestamp: parse_timestamp(index, array_field(index, arr, ts)?)?,
        open: parse_price(index, open.0, array_field(index, arr, open)?)?,
        high: parse_price(index, high.0, array_field(index, arr, high)?)?,
        low: parse_price(index, low.0, array_field(index, arr, low)?)?,
        close: parse_price(index, close.0, array_field(index, arr, close)?)?,
        volume: parse_price(index, volume.0, array_field(index, arr, volume)?)?,
    })
}

fn parse_object_record(index: usize, obj: &Value) -> Result<PricePeriod, AnalysisError> {
    let ts = obj
        .get("timestamp")
        .or_else(|| obj.get("open_time"))
        .ok_or_else(|| AnalysisError::malformed(index, "timestamp", "missing field"))?;

    Ok(PricePeriod {
        timestamp: parse_timestamp(index, ts)?,
        open: parse_price(index, "open", object_field(index, obj, "open")?)?,
        high: parse_price(index, "high", object_field(index, obj, "high")?)?,
        low: parse_price(index, "low", object_field(index, obj, "low")?)?,
        close: parse_price(index, "close", object_field(index, obj, "close")?)?,
        volume: parse_price(index, "volume", object_field(index, obj, "volume")?)?,
    })
}

fn array_field<'a>(
    index: usize,
    arr: &'a [Value],
    (name, pos): (&'static str, usize),
) -> Result<&'a Value, AnalysisError> {
    arr.get(pos)
        .ok_or_else(|| AnalysisError::malformed(index, name, "missing field"))
}

fn object_field<'a>(index: usize, obj: &'a Value, name: &'static str) -> Result<&'a Value, AnalysisError> {
    obj.get(name)
        .ok_or_else(|| AnalysisError::malformed(index, name, "missing field"))
}

/// Binance sends prices as JSON strings; other sources send numbers.
fn parse_price(index: usize, name: &'static str, val: &Value) -> Result<f64, AnalysisError> {
    let parsed = match val {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| AnalysisError::malformed(index, name, format!("'{s}' is not a number")))?,
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| AnalysisError::malformed(index, name, "number out of range"))?,
        _ => return Err(AnalysisError::malformed(index, name, "unexpected JSON type")),
    };

    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(AnalysisError::malformed(index, name, "value is not finite"))
    }
}

fn parse_timestamp(index: usize, val: &Value) -> Result<i64, AnalysisError> {
    match val {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| AnalysisError::malformed(index, "timestamp", "not an integer")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| AnalysisError::malformed(index, "timestamp", format!("'{s}' is not an integer"))),
        _ => Err(AnalysisError::malformed(index, "timestamp", "unexpected JSON type")),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
