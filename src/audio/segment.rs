//! Fixed-length windowing with overlap.

use crate::error::{Error, Result};

/// A fixed-length slice of a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Position of this window within its recording.
    pub index: usize,
    /// Offset of the first sample in the source waveform.
    pub start: usize,
    /// Exactly `segment_samples` samples.
    pub samples: Vec<f32>,
}

impl Window {
    /// Start time in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn start_time(&self, sample_rate: u32) -> f32 {
        self.start as f32 / sample_rate as f32
    }
}

/// Splits waveforms into overlapping windows of fixed length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    segment_samples: usize,
    hop_samples: usize,
}

impl Segmenter {
    /// Create a segmenter from durations in seconds.
    ///
    /// Sample counts are `round(seconds * sample_rate)`. The hop may exceed the
    /// window length (leaving gaps) but must be at least one sample.
    pub fn new(segment_duration: f32, segment_hop: f32, sample_rate: u32) -> Result<Self> {
        let segment_samples = seconds_to_samples(segment_duration, sample_rate);
        let hop_samples = seconds_to_samples(segment_hop, sample_rate);

        if segment_samples == 0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "segment duration {segment_duration}s is shorter than one sample at {sample_rate} Hz"
                ),
            });
        }
        if hop_samples == 0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "segment hop {segment_hop}s is shorter than one sample at {sample_rate} Hz"
                ),
            });
        }

        Ok(Self {
            segment_samples,
            hop_samples,
        })
    }

    /// Samples per window.
    pub fn segment_samples(&self) -> usize {
        self.segment_samples
    }

    /// Samples between window starts.
    pub fn hop_samples(&self) -> usize {
        self.hop_samples
    }

    /// Number of windows [`Self::segment`] yields for `len` samples.
    pub fn window_count(&self, len: usize) -> usize {
        if len < self.segment_samples {
            1
        } else {
            (len - self.segment_samples) / self.hop_samples + 1
        }
    }

    /// Split samples into windows.
    ///
    /// Short input yields one right-zero-padded window. Longer input yields
    /// every full window starting at a multiple of the hop; a trailing
    /// remainder that cannot fill another window is dropped.
    pub fn segment(&self, samples: &[f32]) -> Vec<Window> {
        if samples.len() < self.segment_samples {
            let mut padded = samples.to_vec();
            padded.resize(self.segment_samples, 0.0);
            return vec![Window {
                index: 0,
                start: 0,
                samples: padded,
            }];
        }

        (0..self.window_count(samples.len()))
            .map(|index| {
                let start = index * self.hop_samples;
                Window {
                    index,
                    start,
                    samples: samples[start..start + self.segment_samples].to_vec(),
                }
            })
            .collect()
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn seconds_to_samples(seconds: f32, sample_rate: u32) -> usize {
    let samples = (f64::from(seconds) * f64::from(sample_rate)).round();
    if samples.is_finite() && samples > 0.0 {
        samples as usize
    } else {
        0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::cast_precision_loss)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_counts_are_rounded() {
        let seg = Segmenter::new(3.0, 1.5, 22_050).unwrap();
        assert_eq!(seg.segment_samples(), 66_150);
        assert_eq!(seg.hop_samples(), 33_075);

        // 0.1s at 22050 Hz is 2205 exactly; 1/3s rounds 7350.
        let seg = Segmenter::new(1.0 / 3.0, 0.1, 22_050).unwrap();
        assert_eq!(seg.segment_samples(), 7_350);
        assert_eq!(seg.hop_samples(), 2_205);
    }

    #[test]
    fn test_short_clip_is_padded_to_one_window() {
        let seg = Segmenter::new(1.0, 0.5, 10).unwrap();
        let windows = seg.segment(&[1.0, 2.0, 3.0]);
        assert_eq!(windows.len(), 1);
        assert_eq!(
            windows[0].samples,
            vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_empty_input_yields_silent_window() {
        let seg = Segmenter::new(1.0, 0.5, 8).unwrap();
        let windows = seg.segment(&[]);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].samples, vec![0.0; 8]);
    }

    #[test]
    fn test_exact_length_is_identity() {
        let seg = Segmenter::new(1.0, 0.5, 8).unwrap();
        let input: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let windows = seg.segment(&input);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].samples, input);
    }

    #[test]
    fn test_count_law_and_trailing_drop() {
        let seg = Segmenter::new(1.0, 0.5, 10).unwrap();
        for len in 10..60 {
            let input = vec![0.5; len];
            let windows = seg.segment(&input);
            assert_eq!(windows.len(), (len - 10) / 5 + 1, "len {len}");
            assert!(windows.iter().all(|w| w.samples.len() == 10));
            let last = windows.last().unwrap();
            assert!(last.start + 10 <= len);
        }
    }

    #[test]
    fn test_window_contents_and_offsets() {
        let seg = Segmenter::new(0.4, 0.2, 10).unwrap();
        let input: Vec<f32> = (0..9).map(|i| i as f32).collect();
        let windows = seg.segment(&input);
        let starts: Vec<usize> = windows.iter().map(|w| w.start).collect();
        assert_eq!(starts, vec![0, 2, 4]);
        assert_eq!(windows[1].samples, vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(windows[2].index, 2);
        assert_eq!(windows[2].start_time(10), 0.4);
    }

    #[test]
    fn test_hop_larger_than_window_leaves_gaps() {
        let seg = Segmenter::new(0.2, 0.5, 10).unwrap();
        let input: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let windows = seg.segment(&input);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[1].samples, vec![5.0, 6.0]);
        assert_eq!(windows[2].samples, vec![10.0, 11.0]);
    }

    #[test]
    fn test_ten_second_recording_at_default_settings() {
        let seg = Segmenter::new(3.0, 1.5, 22_050).unwrap();
        let input = vec![0.0; 220_500];
        let windows = seg.segment(&input);
        assert_eq!(windows.len(), (220_500 - 66_150) / 33_075 + 1);
        assert_eq!(windows.len(), 5);
        let starts: Vec<usize> = windows.iter().map(|w| w.start).collect();
        assert_eq!(starts, vec![0, 33_075, 66_150, 99_225, 132_300]);
    }

    #[test]
    fn test_zero_hop_is_rejected() {
        assert!(Segmenter::new(3.0, 0.0, 22_050).is_err());
        assert!(Segmenter::new(3.0, -1.0, 22_050).is_err());
        assert!(Segmenter::new(0.0, 1.0, 22_050).is_err());
    }
}
