//! JSON prediction output.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::inference::Prediction;
use crate::output::{OutputWriter, STATUS_OK};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Top-level JSON document.
#[derive(Debug, Serialize)]
pub struct JsonResultFile {
    /// When the document was produced.
    pub generated_at: DateTime<Utc>,
    /// Model used for prediction.
    pub model: String,
    /// Pipeline settings in effect.
    pub settings: JsonSettings,
    /// One entry per input recording, in input order.
    pub results: Vec<JsonFileResult>,
}

/// Pipeline settings echoed into the output.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSettings {
    /// Target sample rate in Hz.
    pub sample_rate: u32,
    /// Window length in seconds.
    pub segment_duration: f32,
    /// Window stride in seconds.
    pub segment_hop: f32,
    /// Mel bands per frame.
    pub n_mels: usize,
    /// Ranked classes per recording.
    pub top_k: usize,
    /// Whether each prediction carries the full mean probability vector.
    pub probabilities: bool,
}

impl From<&Config> for JsonSettings {
    fn from(config: &Config) -> Self {
        Self {
            sample_rate: config.audio.sample_rate,
            segment_duration: config.segment.duration,
            segment_hop: config.segment.hop,
            n_mels: config.features.n_mels,
            top_k: config.inference.top_k,
            probabilities: false,
        }
    }
}

/// Outcome for one recording.
#[derive(Debug, Serialize)]
pub struct JsonFileResult {
    /// Recording path.
    pub path: String,
    /// `ok` or an error kind.
    pub status: String,
    /// Aggregated prediction on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
    /// Mean probability of every class, in class order, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f32>>,
    /// Error message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collects results and writes one pretty-printed JSON document on finalize.
pub struct JsonWriter<W: Write> {
    out: W,
    model: String,
    settings: JsonSettings,
    results: Vec<JsonFileResult>,
}

impl<W: Write> JsonWriter<W> {
    /// Create a JSON writer.
    pub fn new(out: W, model: &str, settings: JsonSettings) -> Self {
        Self {
            out,
            model: model.to_string(),
            settings,
            results: Vec::new(),
        }
    }

    /// Consume the writer and return the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_header(&mut self) -> Result<()> {
        // Whole document is written at finalize.
        Ok(())
    }

    fn write_result(&mut self, path: &Path, result: &Result<Prediction>) -> Result<()> {
        let entry = match result {
            Ok(prediction) => JsonFileResult {
                path: path.display().to_string(),
                status: STATUS_OK.to_string(),
                prediction: Some(prediction.clone()),
                probabilities: self
                    .settings
                    .probabilities
                    .then(|| prediction.probabilities.clone()),
                error: None,
            },
            Err(e) => JsonFileResult {
                path: path.display().to_string(),
                status: e.kind().to_string(),
                prediction: None,
                probabilities: None,
                error: Some(e.to_string()),
            },
        };
        self.results.push(entry);
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let document = JsonResultFile {
            generated_at: Utc::now(),
            model: self.model.clone(),
            settings: self.settings.clone(),
            results: std::mem::take(&mut self.results),
        };

        serde_json::to_writer_pretty(&mut self.out, &document)
            .map_err(|e| Error::JsonSerialize { source: e })?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
