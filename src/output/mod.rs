//! Feature files, run reports, and prediction rendering.

mod json;
mod npy;
pub mod progress;
mod report;
mod text;
mod types;
mod writer;

pub use json::{JsonFileResult, JsonResultFile, JsonSettings, JsonWriter};
pub use npy::{read_npy, write_npy};
pub use report::{read_csv, write_report};
pub use text::TextWriter;
pub use types::{FeatureRecord, PredictionRecord, STATUS_OK};
pub use writer::OutputWriter;

/// Rendering of prediction results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One human-readable block per recording.
    #[default]
    Text,
    /// One JSON document covering every recording.
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
