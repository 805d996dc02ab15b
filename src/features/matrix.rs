//! Two-dimensional feature matrix.

use crate::error::{Error, Result};

/// A `(n_mels, n_frames)` matrix stored row-major (one row per mel band).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    n_mels: usize,
    n_frames: usize,
    data: Vec<f32>,
}

impl FeatureMatrix {
    /// Wrap row-major data; fails if the length does not match the shape.
    pub fn new(n_mels: usize, n_frames: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != n_mels * n_frames {
            return Err(Error::ShapeMismatch {
                message: format!(
                    "expected {n_mels} x {n_frames} = {} values, got {}",
                    n_mels * n_frames,
                    data.len()
                ),
            });
        }
        Ok(Self {
            n_mels,
            n_frames,
            data,
        })
    }

    /// All-zero matrix.
    pub fn zeros(n_mels: usize, n_frames: usize) -> Self {
        Self {
            n_mels,
            n_frames,
            data: vec![0.0; n_mels * n_frames],
        }
    }

    /// Number of mel bands (rows).
    pub fn n_mels(&self) -> usize {
        self.n_mels
    }

    /// Number of frames (columns).
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    /// `(n_mels, n_frames)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_mels, self.n_frames)
    }

    /// Value at `(mel, frame)`.
    pub fn get(&self, mel: usize, frame: usize) -> Option<f32> {
        (mel < self.n_mels && frame < self.n_frames)
            .then(|| self.data[mel * self.n_frames + frame])
    }

    /// One mel band across all frames.
    pub fn row(&self, mel: usize) -> &[f32] {
        &self.data[mel * self.n_frames..(mel + 1) * self.n_frames]
    }

    /// Raw row-major values.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable raw row-major values.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume into raw row-major values.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// True if every value is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Arithmetic mean of all values.
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&v| f64::from(v)).sum::<f64>() / self.data.len() as f64
    }

    /// Population standard deviation of all values.
    #[allow(clippy::cast_precision_loss)]
    pub fn std(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let var = self
            .data
            .iter()
            .map(|&v| {
                let d = f64::from(v) - mean;
                d * d
            })
            .sum::<f64>()
            / self.data.len() as f64;
        var.sqrt()
    }

    /// Shift to zero mean and scale by `1 / (std + epsilon)`.
    ///
    /// A constant matrix becomes all zeros.
    #[allow(clippy::cast_possible_truncation)]
    pub fn standardize(&mut self, epsilon: f32) {
        let mean = self.mean();
        let denom = self.std() + f64::from(epsilon);
        for v in &mut self.data {
            *v = ((f64::from(*v) - mean) / denom) as f32;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_shape() {
        assert!(FeatureMatrix::new(2, 3, vec![0.0; 6]).is_ok());
        assert!(matches!(
            FeatureMatrix::new(2, 3, vec![0.0; 5]),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_row_major_access() {
        let m = FeatureMatrix::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.get(1, 0), Some(4.0));
        assert_eq!(m.get(0, 2), Some(3.0));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_standardize_zero_mean_unit_std() {
        let mut m =
            FeatureMatrix::new(2, 4, vec![-80.0, -20.0, -3.5, 0.0, -40.0, -60.0, -1.0, -12.0])
                .unwrap();
        m.standardize(1e-6);
        assert!(m.mean().abs() < 1e-5);
        assert!((m.std() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_standardize_constant_matrix_is_zero() {
        let mut m = FeatureMatrix::new(1, 4, vec![-80.0; 4]).unwrap();
        m.standardize(1e-6);
        assert!(m.as_slice().iter().all(|&v| v == 0.0));
    }
}
