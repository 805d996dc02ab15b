//! Human-readable prediction output.

use crate::constants::confidence::DECIMAL_PLACES;
use crate::error::Result;
use crate::inference::Prediction;
use crate::output::OutputWriter;
use std::io::Write;
use std::path::Path;

/// Plain text writer: one block per recording.
pub struct TextWriter<W: Write> {
    out: W,
}

impl<W: Write> TextWriter<W> {
    /// Create a text writer over any byte sink.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the writer and return the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputWriter for TextWriter<W> {
    fn write_header(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_result(&mut self, path: &Path, result: &Result<Prediction>) -> Result<()> {
        match result {
            Ok(prediction) => {
                writeln!(
                    self.out,
                    "{}: {} ({:.decimal$}) [{} windows{}]",
                    path.display(),
                    prediction.label,
                    prediction.confidence,
                    prediction.windows_used,
                    if prediction.windows_skipped > 0 {
                        format!(", {} skipped", prediction.windows_skipped)
                    } else {
                        String::new()
                    },
                    decimal = DECIMAL_PLACES,
                )?;
                for (rank, score) in prediction.top_k.iter().enumerate() {
                    writeln!(
                        self.out,
                        "  {}. {} {:.decimal$}",
                        rank + 1,
                        score.label,
                        score.probability,
                        decimal = DECIMAL_PLACES,
                    )?;
                }
            }
            Err(e) => {
                writeln!(self.out, "{}: {} ({e})", path.display(), e.kind())?;
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
