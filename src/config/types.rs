//! Configuration type definitions.

use crate::constants::spectrogram::{HOP_LENGTH, N_FFT, N_MELS, TOP_DB};
use crate::constants::{
    DEFAULT_SAMPLE_RATE, DEFAULT_SEGMENT_DURATION, DEFAULT_SEGMENT_HOP, DEFAULT_TOP_K,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decoding settings.
    pub audio: AudioConfig,

    /// Windowing settings.
    pub segment: SegmentConfig,

    /// Spectrogram settings.
    pub features: FeatureConfig,

    /// Prediction settings.
    pub inference: InferenceConfig,
}

/// Audio decoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Every recording is resampled to this rate (Hz).
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Windowing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Window length in seconds.
    pub duration: f32,

    /// Stride between window starts in seconds.
    pub hop: f32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_SEGMENT_DURATION,
            hop: DEFAULT_SEGMENT_HOP,
        }
    }
}

/// Log-mel spectrogram settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// FFT frame size.
    pub n_fft: usize,

    /// STFT hop in samples.
    pub hop_length: usize,

    /// Number of mel bands.
    pub n_mels: usize,

    /// Dynamic range kept below the loudest bin, in dB.
    pub top_db: f32,

    /// Standardize features written by dataset generation.
    pub standardize_dataset: bool,

    /// Standardize features fed to the model.
    pub standardize_inference: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            n_fft: N_FFT,
            hop_length: HOP_LENGTH,
            n_mels: N_MELS,
            top_db: TOP_DB,
            standardize_dataset: false,
            standardize_inference: true,
        }
    }
}

/// Prediction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Number of ranked classes reported per recording.
    pub top_k: usize,

    /// Default ONNX model path.
    pub model: Option<PathBuf>,

    /// Default class label file.
    pub classes: Option<PathBuf>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            model: None,
            classes: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.audio.sample_rate, 22_050);
        assert_eq!(config.segment.duration, 3.0);
        assert_eq!(config.segment.hop, 1.5);
        assert_eq!(config.features.n_fft, 2048);
        assert_eq!(config.features.hop_length, 512);
        assert_eq!(config.features.n_mels, 128);
        assert_eq!(config.features.top_db, 80.0);
        assert!(!config.features.standardize_dataset);
        assert!(config.features.standardize_inference);
        assert_eq!(config.inference.top_k, 5);
        assert!(config.inference.model.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r"
[segment]
hop = 0.75

[features]
n_mels = 64
",
        )
        .unwrap();
        assert_eq!(config.segment.hop, 0.75);
        assert_eq!(config.segment.duration, 3.0);
        assert_eq!(config.features.n_mels, 64);
        assert_eq!(config.features.n_fft, 2048);
        assert_eq!(config.audio.sample_rate, 22_050);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.inference.model = Some(PathBuf::from("/models/birds.onnx"));
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
