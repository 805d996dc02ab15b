//! Stack feature matrices into one zero-padded batch.

use crate::error::{Error, Result};
use crate::features::FeatureMatrix;

/// `N` feature matrices padded to a common frame count.
///
/// Logical shape `(len, n_mels, max_frames)`, stored contiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    data: Vec<f32>,
    len: usize,
    n_mels: usize,
    max_frames: usize,
    frames: Vec<usize>,
}

impl Batch {
    /// `(len, n_mels, max_frames)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.len, self.n_mels, self.max_frames)
    }

    /// Number of matrices in the batch.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the batch holds no matrices.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mel bands per matrix.
    pub fn n_mels(&self) -> usize {
        self.n_mels
    }

    /// Padded frame count.
    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Frame count of each matrix before padding.
    pub fn original_frames(&self) -> &[usize] {
        &self.frames
    }

    /// The `index`-th padded matrix, row-major `(n_mels, max_frames)`.
    pub fn item(&self, index: usize) -> Option<&[f32]> {
        let stride = self.n_mels * self.max_frames;
        (index < self.len).then(|| &self.data[index * stride..(index + 1) * stride])
    }

    /// Value at `(index, mel, frame)`.
    pub fn get(&self, index: usize, mel: usize, frame: usize) -> Option<f32> {
        (index < self.len && mel < self.n_mels && frame < self.max_frames).then(|| {
            self.data[(index * self.n_mels + mel) * self.max_frames + frame]
        })
    }

    /// Contiguous values.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Builds [`Batch`]es from ordered feature matrices.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchAssembler;

impl BatchAssembler {
    /// Right-pad every matrix with zeros to the longest frame count and stack.
    ///
    /// Order is preserved. Padding values are exact zeros.
    pub fn assemble(&self, matrices: &[FeatureMatrix]) -> Result<Batch> {
        let first = matrices.first().ok_or(Error::EmptyBatch)?;
        let n_mels = first.n_mels();
        if n_mels == 0 {
            return Err(Error::ShapeMismatch {
                message: "matrices have no mel bands".to_string(),
            });
        }

        if let Some((i, m)) = matrices
            .iter()
            .enumerate()
            .find(|(_, m)| m.n_mels() != n_mels)
        {
            return Err(Error::ShapeMismatch {
                message: format!(
                    "matrix {i} has {} mel bands, expected {n_mels}",
                    m.n_mels()
                ),
            });
        }

        let max_frames = matrices
            .iter()
            .map(FeatureMatrix::n_frames)
            .max()
            .unwrap_or(0);

        let mut data = vec![0.0_f32; matrices.len() * n_mels * max_frames];
        for (item, matrix) in data
            .chunks_exact_mut((n_mels * max_frames).max(1))
            .zip(matrices)
        {
            for mel in 0..n_mels {
                let row = matrix.row(mel);
                item[mel * max_frames..mel * max_frames + row.len()].copy_from_slice(row);
            }
        }

        Ok(Batch {
            data,
            len: matrices.len(),
            n_mels,
            max_frames,
            frames: matrices.iter().map(FeatureMatrix::n_frames).collect(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::cast_precision_loss)]
mod tests {
    use super::*;

    fn filled(n_mels: usize, n_frames: usize, value: f32) -> FeatureMatrix {
        FeatureMatrix::new(n_mels, n_frames, vec![value; n_mels * n_frames]).unwrap()
    }

    #[test]
    fn test_shape_and_zero_padding() {
        let batch = BatchAssembler
            .assemble(&[filled(3, 5, 1.0), filled(3, 2, -2.0), filled(3, 4, 0.5)])
            .unwrap();
        assert_eq!(batch.shape(), (3, 3, 5));
        assert_eq!(batch.original_frames(), &[5, 2, 4]);

        for mel in 0..3 {
            for frame in 0..5 {
                assert_eq!(batch.get(0, mel, frame), Some(1.0));
                let expect = if frame < 2 { -2.0 } else { 0.0 };
                assert_eq!(batch.get(1, mel, frame), Some(expect));
                let expect = if frame < 4 { 0.5 } else { 0.0 };
                assert_eq!(batch.get(2, mel, frame), Some(expect));
            }
        }
    }

    #[test]
    fn test_preserves_order_and_row_layout() {
        let a = FeatureMatrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = FeatureMatrix::new(2, 3, vec![5.0, 6.0, 7.0, 8.0, 9.0, 10.0]).unwrap();
        let batch = BatchAssembler.assemble(&[a, b]).unwrap();
        assert_eq!(batch.item(0).unwrap(), &[1.0, 2.0, 0.0, 3.0, 4.0, 0.0]);
        assert_eq!(batch.item(1).unwrap(), &[5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        assert!(batch.item(2).is_none());
    }

    #[test]
    fn test_uniform_frames_need_no_padding() {
        let batch = BatchAssembler
            .assemble(&[filled(2, 4, 1.0), filled(2, 4, 2.0)])
            .unwrap();
        assert_eq!(batch.shape(), (2, 2, 4));
        assert!(batch.as_slice().iter().all(|&v| v != 0.0));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            BatchAssembler.assemble(&[]),
            Err(Error::EmptyBatch)
        ));
    }

    #[test]
    fn test_mel_mismatch_is_rejected() {
        assert!(matches!(
            BatchAssembler.assemble(&[filled(2, 4, 1.0), filled(3, 4, 1.0)]),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_mel_bands_are_rejected() {
        let empty = FeatureMatrix::new(0, 4, Vec::new()).unwrap();
        assert!(matches!(
            BatchAssembler.assemble(&[empty]),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
