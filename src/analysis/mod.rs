// =============================================================================
// Analysis Module
// =============================================================================
//
// Snapshot pipeline on top of the indicator primitives:
// - Engine: Series -> classified indicator results + chart series
// - Service: fetch -> ingest -> engine -> render
// - Report types and the error taxonomy shared by every layer

pub mod engine;
pub mod error;
pub mod report;
pub mod service;

pub use engine::analyze;
pub use error::{AnalysisError, ErrorKind};
pub use report::{
    AnalysisReport, ChartArtifact, ChartRequest, EngineOutput, IndicatorKind, IndicatorResult,
    IndicatorValue,
};
pub use service::{run_analysis, AnalysisRequest, ReportError};
