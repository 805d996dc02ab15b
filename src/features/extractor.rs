//! Window -> log-mel feature matrix.

use crate::audio::Window;
use crate::config::FeatureConfig;
use crate::constants::spectrogram::{AMIN, STD_EPSILON};
use crate::error::{Error, Result};
use crate::features::{FeatureMatrix, MelSpectrogram};

/// Post-processing applied after the decibel conversion.
///
/// Dataset generation has historically written plain log-power features while
/// inference standardizes each window. Both paths name their mode explicitly so
/// the difference stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Decibels relative to the window peak, floored at `-top_db`.
    LogPower,
    /// `LogPower`, then shifted to zero mean and unit variance.
    Standardized,
}

impl Normalization {
    /// Pick the mode from a boolean config flag.
    pub const fn from_flag(standardize: bool) -> Self {
        if standardize {
            Self::Standardized
        } else {
            Self::LogPower
        }
    }
}

/// Converts windows into log-mel feature matrices.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    spectrogram: MelSpectrogram,
    top_db: f32,
}

impl FeatureExtractor {
    /// Build an extractor for audio at `sample_rate`.
    pub fn new(sample_rate: u32, config: &FeatureConfig) -> Result<Self> {
        if !(config.top_db.is_finite() && config.top_db > 0.0) {
            return Err(Error::ConfigValidation {
                message: format!("top_db must be positive, got {}", config.top_db),
            });
        }

        Ok(Self {
            spectrogram: MelSpectrogram::new(
                sample_rate,
                config.n_fft,
                config.hop_length,
                config.n_mels,
            )?,
            top_db: config.top_db,
        })
    }

    /// Mel bands per matrix.
    pub fn n_mels(&self) -> usize {
        self.spectrogram.n_mels()
    }

    /// Frames per matrix for windows of `window_len` samples.
    pub fn frame_count(&self, window_len: usize) -> usize {
        self.spectrogram.frame_count(window_len)
    }

    /// Compute the feature matrix for one window.
    ///
    /// Non-finite input or output is reported as a per-window failure so the
    /// caller can drop the window and keep its siblings.
    pub fn extract(&self, window: &Window, normalization: Normalization) -> Result<FeatureMatrix> {
        if let Some(pos) = window.samples.iter().position(|s| !s.is_finite()) {
            return Err(Error::FeatureExtraction {
                window: window.index,
                reason: format!("non-finite sample at offset {pos}"),
            });
        }

        let mut matrix = self.spectrogram.compute(&window.samples);
        if !matrix.is_finite() {
            return Err(Error::FeatureExtraction {
                window: window.index,
                reason: "mel power spectrum overflowed".to_string(),
            });
        }

        power_to_db(&mut matrix, self.top_db);

        if normalization == Normalization::Standardized {
            matrix.standardize(STD_EPSILON);
        }

        if !matrix.is_finite() {
            return Err(Error::FeatureExtraction {
                window: window.index,
                reason: "normalization produced non-finite values".to_string(),
            });
        }

        Ok(matrix)
    }
}

/// Convert power to decibels relative to the matrix peak, in place.
///
/// `10 * log10(max(amin, p)) - 10 * log10(max(amin, peak))`, then floored at
/// `-top_db` below the loudest value. Silence maps to a constant 0 dB.
pub fn power_to_db(matrix: &mut FeatureMatrix, top_db: f32) {
    let values = matrix.as_mut_slice();
    let peak = values.iter().copied().fold(0.0_f32, f32::max);
    let reference = 10.0 * peak.max(AMIN).log10();

    let mut loudest = f32::NEG_INFINITY;
    for v in values.iter_mut() {
        *v = 10.0 * v.max(AMIN).log10() - reference;
        loudest = loudest.max(*v);
    }

    let floor = loudest - top_db;
    for v in values.iter_mut() {
        *v = v.max(floor);
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::cast_precision_loss,
    clippy::panic
)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(22_050, &FeatureConfig::default()).unwrap()
    }

    fn chirp_window(len: usize) -> Window {
        let samples = (0..len)
            .map(|i| {
                let t = i as f32 / 22_050.0;
                0.6 * (2.0 * PI * (1_500.0 + 1_000.0 * t) * t).sin()
                    + 0.05 * (2.0 * PI * 7_000.0 * t).sin()
            })
            .collect();
        Window {
            index: 0,
            start: 0,
            samples,
        }
    }

    #[test]
    fn test_log_power_is_bounded() {
        let m = extractor()
            .extract(&chirp_window(66_150), Normalization::LogPower)
            .unwrap();
        assert_eq!(m.shape(), (128, 130));
        let max = m.as_slice().iter().copied().fold(f32::MIN, f32::max);
        let min = m.as_slice().iter().copied().fold(f32::MAX, f32::min);
        assert!(max.abs() < 1e-4);
        assert!(min >= -80.0 - 1e-4);
    }

    #[test]
    fn test_standardized_has_zero_mean_unit_std() {
        let m = extractor()
            .extract(&chirp_window(66_150), Normalization::Standardized)
            .unwrap();
        assert!(m.mean().abs() < 1e-4);
        assert!((m.std() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_amplitude_invariance() {
        let ex = extractor();
        let quiet = chirp_window(22_050);
        let mut loud = quiet.clone();
        for s in &mut loud.samples {
            *s *= 4.0;
        }
        let a = ex.extract(&quiet, Normalization::LogPower).unwrap();
        let b = ex.extract(&loud, Normalization::LogPower).unwrap();
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert!((x - y).abs() < 1e-2);
        }
    }

    #[test]
    fn test_silent_window_is_constant() {
        let window = Window {
            index: 3,
            start: 0,
            samples: vec![0.0; 4096],
        };
        let ex = extractor();
        let log = ex.extract(&window, Normalization::LogPower).unwrap();
        assert!(log.as_slice().iter().all(|&v| v == 0.0));
        let std = ex.extract(&window, Normalization::Standardized).unwrap();
        assert!(std.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_non_finite_window_fails_with_index() {
        let window = Window {
            index: 7,
            start: 0,
            samples: vec![0.0, f32::NAN, 0.0],
        };
        match extractor().extract(&window, Normalization::LogPower) {
            Err(Error::FeatureExtraction { window, .. }) => assert_eq!(window, 7),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_power_to_db_floor() {
        let mut m = FeatureMatrix::new(1, 3, vec![1.0, 1e-3, 1e-12]).unwrap();
        power_to_db(&mut m, 80.0);
        assert!((m.as_slice()[0]).abs() < 1e-6);
        assert!((m.as_slice()[1] + 30.0).abs() < 1e-4);
        assert!((m.as_slice()[2] + 80.0).abs() < 1e-4);
    }

    #[test]
    fn test_normalization_from_flag() {
        assert_eq!(Normalization::from_flag(true), Normalization::Standardized);
        assert_eq!(Normalization::from_flag(false), Normalization::LogPower);
    }
}
