//! Error types for birdmel.

use std::path::PathBuf;

/// Result type alias for birdmel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// One failed decode attempt, kept so a load failure can explain every strategy tried.
#[derive(Debug)]
pub struct DecodeAttempt {
    /// Name of the decode strategy.
    pub strategy: &'static str,
    /// Why it failed.
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

impl std::fmt::Display for DecodeAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.strategy, self.error)
    }
}

/// Top-level error type for birdmel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// No valid audio files found.
    #[error("no valid audio files found in the provided paths")]
    NoValidAudioFiles,

    /// Every decode strategy failed for a recording.
    #[error("failed to load audio '{}': {}", .path.display(), format_attempts(.attempts))]
    AudioLoad {
        /// Path to the audio file.
        path: PathBuf,
        /// Each strategy tried, in order.
        attempts: Vec<DecodeAttempt>,
    },

    /// Failed to resample audio.
    #[error("failed to resample audio: {reason}")]
    Resample {
        /// Description of the resampling failure.
        reason: String,
    },

    /// Spectrogram computation failed for one window.
    #[error("feature extraction failed for window {window}: {reason}")]
    FeatureExtraction {
        /// Index of the window within its recording.
        window: usize,
        /// Description of the numerical failure.
        reason: String,
    },

    /// A recording produced no usable windows.
    #[error("no usable windows for '{}'", .path.display())]
    EmptyResult {
        /// Path to the recording.
        path: PathBuf,
    },

    /// Aggregation was given zero window outputs.
    #[error("no window outputs to aggregate")]
    NoWindows,

    /// Attempted to assemble a batch from zero matrices.
    #[error("cannot assemble a batch from zero feature matrices")]
    EmptyBatch,

    /// Feature matrices disagree on shape.
    #[error("shape mismatch: {message}")]
    ShapeMismatch {
        /// Description of the mismatch.
        message: String,
    },

    /// Failed to load the classification model.
    #[error("failed to load model '{}': {reason}", .path.display())]
    ModelLoad {
        /// Path to the model file.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// Model file does not exist.
    #[error("model file does not exist: {}", .path.display())]
    ModelFileNotFound {
        /// Path to the missing model file.
        path: PathBuf,
    },

    /// Inference failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the inference failure.
        reason: String,
    },

    /// Failed to read class labels file.
    #[error("failed to read labels file '{}'", .path.display())]
    LabelsRead {
        /// Path to the labels file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to read the dataset labels CSV.
    #[error("failed to read dataset index '{}'", .path.display())]
    DatasetRead {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to write a feature tensor.
    #[error("failed to write feature file '{}'", .path.display())]
    NpyWrite {
        /// Path to the `.npy` file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to read a feature tensor.
    #[error("invalid feature file '{}': {reason}", .path.display())]
    NpyRead {
        /// Path to the `.npy` file.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// Failed to write a run report.
    #[error("failed to write report '{}'", .path.display())]
    ReportWrite {
        /// Path to the report file.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{}'", .path.display())]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize JSON output.
    #[error("failed to serialize JSON output")]
    JsonSerialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Short machine-readable category, used in run reports.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AudioLoad { .. } | Self::Resample { .. } => "audio_load_error",
            Self::FeatureExtraction { .. } => "feature_extraction_error",
            Self::EmptyResult { .. } | Self::EmptyBatch | Self::NoWindows => "empty_result",
            Self::Inference { .. } | Self::ShapeMismatch { .. } => "inference_error",
            Self::NpyWrite { .. } | Self::OutputDirCreateFailed { .. } => "write_error",
            _ => "error",
        }
    }
}

fn format_attempts(attempts: &[DecodeAttempt]) -> String {
    if attempts.is_empty() {
        return "no decode strategies configured".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_load_message_lists_attempts() {
        let err = Error::AudioLoad {
            path: PathBuf::from("x.mp3"),
            attempts: vec![
                DecodeAttempt {
                    strategy: "symphonia",
                    error: "unsupported container".into(),
                },
                DecodeAttempt {
                    strategy: "wav",
                    error: "not a RIFF file".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("x.mp3"));
        assert!(msg.contains("symphonia: unsupported container"));
        assert!(msg.contains("wav: not a RIFF file"));
        assert_eq!(err.kind(), "audio_load_error");
    }

    #[test]
    fn test_empty_result_is_distinct_kind() {
        let err = Error::EmptyResult {
            path: PathBuf::from("a.wav"),
        };
        assert_eq!(err.kind(), "empty_result");
    }
}
