//! Mel power spectrogram.
//!
//! # Algorithm
//!
//! 1. Zero-pad the signal by `n_fft / 2` on both sides (centered frames)
//! 2. Frame with stride `hop_length`, apply a periodic Hann window
//! 3. FFT each frame and keep the power of the `n_fft / 2 + 1` positive bins
//! 4. Project onto Slaney-normalized triangular filters on the Slaney mel scale

use crate::constants::mel_scale::{F_SP, LOG_STEP, MIN_LOG_HZ};
use crate::error::{Error, Result};
use crate::features::FeatureMatrix;
use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::f32::consts::PI;
use std::sync::Arc;

/// Convert Hz to mels (Slaney scale: linear below 1 kHz, logarithmic above).
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_HZ / F_SP + (hz / MIN_LOG_HZ).ln() / LOG_STEP
    } else {
        hz / F_SP
    }
}

/// Convert mels back to Hz (inverse of [`hz_to_mel`]).
pub fn mel_to_hz(mel: f64) -> f64 {
    let min_log_mel = MIN_LOG_HZ / F_SP;
    if mel >= min_log_mel {
        MIN_LOG_HZ * (LOG_STEP * (mel - min_log_mel)).exp()
    } else {
        F_SP * mel
    }
}

/// One triangular filter: first non-zero bin and its weights.
#[derive(Debug, Clone)]
struct Filter {
    start: usize,
    weights: Vec<f32>,
}

/// Triangular mel filterbank with Slaney area normalization.
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    n_freqs: usize,
    filters: Vec<Filter>,
}

impl MelFilterbank {
    /// Build `n_mels` filters spanning `fmin..=fmax` Hz for an `n_fft` spectrum.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize, fmin: f64, fmax: f64) -> Self {
        let n_freqs = n_fft / 2 + 1;
        let bin_hz = f64::from(sample_rate) / n_fft as f64;

        let mel_min = hz_to_mel(fmin);
        let mel_max = hz_to_mel(fmax);
        let edges: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f64 / (n_mels + 1) as f64))
            .collect();

        let filters = edges
            .windows(3)
            .map(|e| {
                let (lower, center, upper) = (e[0], e[1], e[2]);
                let enorm = 2.0 / (upper - lower);
                let weights: Vec<f64> = (0..n_freqs)
                    .map(|k| {
                        let f = k as f64 * bin_hz;
                        let rising = (f - lower) / (center - lower);
                        let falling = (upper - f) / (upper - center);
                        rising.min(falling).max(0.0) * enorm
                    })
                    .collect();

                let start = weights.iter().position(|&w| w > 0.0).unwrap_or(0);
                let end = weights
                    .iter()
                    .rposition(|&w| w > 0.0)
                    .map_or(start, |i| i + 1);
                Filter {
                    start,
                    weights: weights[start..end].iter().map(|&w| w as f32).collect(),
                }
            })
            .collect();

        Self { n_freqs, filters }
    }

    /// Number of mel bands.
    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    /// Number of spectrum bins each filter expects.
    pub fn n_freqs(&self) -> usize {
        self.n_freqs
    }

    /// Weight of `bin` in filter `mel`.
    pub fn weight(&self, mel: usize, bin: usize) -> f32 {
        self.filters.get(mel).map_or(0.0, |f| {
            bin.checked_sub(f.start)
                .and_then(|i| f.weights.get(i))
                .copied()
                .unwrap_or(0.0)
        })
    }

    /// Project one power spectrum onto the filters, writing one value per band.
    fn apply(&self, power: &[f32], out: &mut [f32]) {
        for (filter, slot) in self.filters.iter().zip(out.iter_mut()) {
            *slot = filter
                .weights
                .iter()
                .zip(&power[filter.start..])
                .map(|(w, p)| w * p)
                .sum();
        }
    }
}

/// Centered short-time Fourier transform followed by a mel projection.
#[derive(Clone)]
pub struct MelSpectrogram {
    n_fft: usize,
    hop_length: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    filterbank: MelFilterbank,
}

impl std::fmt::Debug for MelSpectrogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MelSpectrogram")
            .field("n_fft", &self.n_fft)
            .field("hop_length", &self.hop_length)
            .field("n_mels", &self.filterbank.n_mels())
            .finish_non_exhaustive()
    }
}

impl MelSpectrogram {
    /// Plan the FFT and build the filterbank (`fmin = 0`, `fmax = sr / 2`).
    pub fn new(sample_rate: u32, n_fft: usize, hop_length: usize, n_mels: usize) -> Result<Self> {
        if sample_rate == 0 || n_fft == 0 || hop_length == 0 || n_mels == 0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "spectrogram parameters must be positive (sample_rate={sample_rate}, n_fft={n_fft}, hop_length={hop_length}, n_mels={n_mels})"
                ),
            });
        }

        let fft = FftPlanner::new().plan_fft_forward(n_fft);
        let filterbank =
            MelFilterbank::new(sample_rate, n_fft, n_mels, 0.0, f64::from(sample_rate) / 2.0);

        Ok(Self {
            n_fft,
            hop_length,
            window: hann_window(n_fft),
            fft,
            filterbank,
        })
    }

    /// Number of mel bands produced.
    pub fn n_mels(&self) -> usize {
        self.filterbank.n_mels()
    }

    /// Frames produced for a signal of `len` samples: `1 + len / hop_length`.
    pub fn frame_count(&self, len: usize) -> usize {
        1 + len / self.hop_length
    }

    /// The filterbank in use.
    pub fn filterbank(&self) -> &MelFilterbank {
        &self.filterbank
    }

    /// Compute the `(n_mels, n_frames)` mel power spectrogram.
    pub fn compute(&self, samples: &[f32]) -> FeatureMatrix {
        let pad = self.n_fft / 2;
        let mut padded = vec![0.0_f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let n_frames = self.frame_count(samples.len());
        let n_mels = self.n_mels();
        let n_freqs = self.filterbank.n_freqs();

        let mut out = FeatureMatrix::zeros(n_mels, n_frames);
        let mut buffer = vec![Complex::new(0.0_f32, 0.0); self.n_fft];
        let mut scratch = vec![Complex::new(0.0_f32, 0.0); self.fft.get_inplace_scratch_len()];
        let mut power = vec![0.0_f32; n_freqs];
        let mut bands = vec![0.0_f32; n_mels];

        for frame in 0..n_frames {
            let start = frame * self.hop_length;
            for ((slot, &s), &w) in buffer
                .iter_mut()
                .zip(&padded[start..start + self.n_fft])
                .zip(&self.window)
            {
                *slot = Complex::new(s * w, 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (p, c) in power.iter_mut().zip(&buffer[..n_freqs]) {
                *p = c.norm_sqr();
            }

            self.filterbank.apply(&power, &mut bands);
            let data = out.as_mut_slice();
            for (mel, &v) in bands.iter().enumerate() {
                data[mel * n_frames + frame] = v;
            }
        }

        out
    }
}

/// Periodic Hann window (the DFT-even form used for spectral analysis).
#[allow(clippy::cast_precision_loss)]
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::cast_precision_loss)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_round_trip_and_breakpoint() {
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-9);
        assert!((hz_to_mel(500.0) - 7.5).abs() < 1e-9);
        for hz in [0.0, 200.0, 999.0, 1000.0, 4000.0, 11_025.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 1e-6);
        }
    }

    #[test]
    fn test_filterbank_shape_and_support() {
        let fb = MelFilterbank::new(22_050, 2048, 128, 0.0, 11_025.0);
        assert_eq!(fb.n_mels(), 128);
        assert_eq!(fb.n_freqs(), 1025);
        for mel in 0..128 {
            let total: f32 = (0..1025).map(|k| fb.weight(mel, k)).sum();
            assert!(total > 0.0, "empty filter {mel}");
            assert!((0..1025).all(|k| fb.weight(mel, k) >= 0.0));
        }
    }

    #[test]
    fn test_hann_window_is_periodic() {
        let w = hann_window(8);
        assert_eq!(w[0], 0.0);
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert!((w[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_frame_count_is_centered() {
        let spec = MelSpectrogram::new(22_050, 2048, 512, 128).unwrap();
        assert_eq!(spec.frame_count(66_150), 130);
        let m = spec.compute(&vec![0.0; 66_150]);
        assert_eq!(m.shape(), (128, 130));
    }

    #[test]
    fn test_tone_energy_lands_in_matching_band() {
        let sr = 22_050;
        let spec = MelSpectrogram::new(sr, 2048, 512, 128).unwrap();
        let samples: Vec<f32> = (0..sr)
            .map(|i| (2.0 * PI * 2_000.0 * i as f32 / sr as f32).sin())
            .collect();
        let m = spec.compute(&samples);

        let frame = m.n_frames() / 2;
        let peak_band = (0..m.n_mels())
            .max_by(|&a, &b| m.get(a, frame).unwrap().total_cmp(&m.get(b, frame).unwrap()))
            .unwrap();
        let target = hz_to_mel(2_000.0) / hz_to_mel(11_025.0) * 129.0;
        assert!((peak_band as f64 - target).abs() <= 2.0, "band {peak_band}");
    }

    #[test]
    fn test_rejects_zero_parameters() {
        assert!(MelSpectrogram::new(22_050, 0, 512, 128).is_err());
        assert!(MelSpectrogram::new(22_050, 2048, 0, 128).is_err());
        assert!(MelSpectrogram::new(0, 2048, 512, 128).is_err());
    }
}
