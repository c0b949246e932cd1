// =============================================================================
// Chart rendering
// =============================================================================
//
// Turns a `ChartRequest` (close / EMA / SMA series) into an image file the
// HTML report can embed. Rendering is synchronous file I/O and is expected to
// run on a blocking thread.

pub mod svg;

use anyhow::Result;

use crate::analysis::{ChartArtifact, ChartRequest};

pub use svg::SvgChartRenderer;

pub trait ChartRenderer: Send + Sync {
    fn render(&self, request: &ChartRequest) -> Result<ChartArtifact>;
}
