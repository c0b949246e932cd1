// =============================================================================
// Analysis error taxonomy
// =============================================================================
//
// Every failure on the request path is one of these values. None of them is
// fatal to the host process; the HTTP layer maps each variant to a status.
// =============================================================================

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The series is shorter than the longest indicator lookback.
    #[error("insufficient data: {available} periods available, at least {required} required")]
    InsufficientHistory { required: usize, available: usize },

    /// A raw candle record is missing a field or carries a non-numeric value.
    #[error("malformed candle at index {index}: field '{field}' {reason}")]
    MalformedInput {
        index: usize,
        field: String,
        reason: String,
    },

    /// The market-data source was unreachable or answered with an unexpected shape.
    #[error("upstream market-data failure: {0}")]
    UpstreamFailure(String),

    /// An indicator produced a non-finite intermediate value.
    #[error("degenerate computation in {indicator}")]
    DegenerateComputation { indicator: &'static str },

    /// The caller supplied an unusable symbol, interval or limit.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AnalysisError {
    pub fn malformed(index: usize, field: &str, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            index,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable tag used in API error bodies.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientHistory { .. } => ErrorKind::InsufficientHistory,
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
            Self::UpstreamFailure(_) => ErrorKind::UpstreamFailure,
            Self::DegenerateComputation { .. } => ErrorKind::DegenerateComputation,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientHistory,
    MalformedInput,
    UpstreamFailure,
    DegenerateComputation,
    InvalidRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_history_message_is_descriptive() {
        let err = AnalysisError::InsufficientHistory {
            required: 52,
            available: 51,
        };
        let msg = err.to_string();
        assert!(msg.contains("51"));
        assert!(msg.contains("52"));
        assert_eq!(err.kind(), ErrorKind::InsufficientHistory);
    }

    #[test]
    fn malformed_carries_index_and_field() {
        let err = AnalysisError::malformed(7, "close", "is not a number");
        assert_eq!(err.to_string(), "malformed candle at index 7: field 'close' is not a number");
    }

    #[test]
    fn kind_serialises_snake_case() {
        let json = serde_json::to_string(&ErrorKind::UpstreamFailure).unwrap();
        assert_eq!(json, "\"upstream_failure\"");
    }
}
