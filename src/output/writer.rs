//! Prediction rendering trait.

use crate::error::Result;
use crate::inference::Prediction;
use crate::pipeline::BatchOutcome;
use std::path::Path;

/// Renders per-recording prediction outcomes.
pub trait OutputWriter {
    /// Write any leading section.
    fn write_header(&mut self) -> Result<()>;

    /// Write the outcome for one recording, success or failure.
    fn write_result(&mut self, path: &Path, result: &Result<Prediction>) -> Result<()>;

    /// Flush buffered output.
    fn finalize(&mut self) -> Result<()>;

    /// Header, every outcome in order, then finalize.
    fn write_outcome(&mut self, outcome: &BatchOutcome) -> Result<()> {
        self.write_header()?;
        for file in &outcome.files {
            self.write_result(&file.path, &file.result)?;
        }
        self.finalize()
    }
}
