//! Shared load -> segment -> extract stage.

use crate::audio::{AudioLoader, Segmenter};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::features::{FeatureExtractor, FeatureMatrix, Normalization};
use std::path::Path;
use tracing::{debug, warn};

/// Feature matrices for one recording.
#[derive(Debug, Clone)]
pub struct RecordingFeatures {
    /// Decoded duration in seconds at the target rate.
    pub duration_secs: f32,
    /// Windows produced by segmentation.
    pub windows: usize,
    /// `(window index, matrix)` for every window that extracted cleanly.
    pub features: Vec<(usize, FeatureMatrix)>,
    /// Windows dropped after a feature extraction failure.
    pub skipped: usize,
}

/// Loader, segmenter, and extractor built from one configuration.
#[derive(Debug)]
pub struct FeaturePipeline {
    loader: AudioLoader,
    segmenter: Segmenter,
    extractor: FeatureExtractor,
}

impl FeaturePipeline {
    /// Build every stage from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_loader(AudioLoader::new(config.audio.sample_rate), config)
    }

    /// Build with a custom loader (e.g. a different decoder order).
    pub fn with_loader(loader: AudioLoader, config: &Config) -> Result<Self> {
        let sample_rate = loader.target_rate();
        Ok(Self {
            segmenter: Segmenter::new(config.segment.duration, config.segment.hop, sample_rate)?,
            extractor: FeatureExtractor::new(sample_rate, &config.features)?,
            loader,
        })
    }

    /// The segmenter in use.
    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// The feature extractor in use.
    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Load, window, and extract features for one recording.
    ///
    /// Load failures propagate. A window that fails extraction is logged and
    /// dropped; its siblings continue.
    pub fn process(&self, path: &Path, normalization: Normalization) -> Result<RecordingFeatures> {
        let waveform = self.loader.load(path)?;
        let windows = self.segmenter.segment(&waveform.samples);
        debug!(
            "{}: {:.1}s -> {} windows",
            path.display(),
            waveform.duration_secs(),
            windows.len()
        );

        let mut features = Vec::with_capacity(windows.len());
        let mut skipped = 0;
        for window in &windows {
            match self.extractor.extract(window, normalization) {
                Ok(matrix) => features.push((window.index, matrix)),
                Err(e @ Error::FeatureExtraction { .. }) => {
                    warn!("Skipping window in {}: {e}", path.display());
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(RecordingFeatures {
            duration_secs: waveform.duration_secs(),
            windows: windows.len(),
            features,
            skipped,
        })
    }
}
