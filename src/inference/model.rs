//! Classification model capability.

use crate::error::{Error, Result};
use crate::features::Batch;
use ort::session::Session;
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Maps a batch of feature matrices to one logit vector per matrix.
pub trait Model: Send + Sync {
    /// Short description used in logs.
    fn name(&self) -> &str;

    /// Raw logits, one row per batch item, in batch order.
    fn predict(&self, batch: &Batch) -> Result<Vec<Vec<f32>>>;
}

/// ONNX Runtime backed model.
///
/// Input is `(N, 1, n_mels, n_frames)` `f32`; the first output is read as
/// `(N, num_classes)` logits.
pub struct OnnxModel {
    path: PathBuf,
    // `Session::run` needs `&mut self`.
    session: Mutex<Session>,
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl OnnxModel {
    /// Load a model file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ModelFileNotFound {
                path: path.to_path_buf(),
            });
        }

        let model_err = |e: ort::Error| Error::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let session = Session::builder()
            .map_err(model_err)?
            .commit_from_file(path)
            .map_err(model_err)?;

        info!("Loaded model: {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            session: Mutex::new(session),
        })
    }
}

impl Model for OnnxModel {
    fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("onnx")
    }

    fn predict(&self, batch: &Batch) -> Result<Vec<Vec<f32>>> {
        let (n, n_mels, n_frames) = batch.shape();
        debug!("Running model on batch ({n}, 1, {n_mels}, {n_frames})");

        let inference_err = |e: ort::Error| Error::Inference {
            reason: e.to_string(),
        };

        let input = Tensor::from_array(([n, 1, n_mels, n_frames], batch.as_slice().to_vec()))
            .map_err(inference_err)?;

        let mut session = self.session.lock().map_err(|_| Error::Inference {
            reason: "model session lock poisoned".to_string(),
        })?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(inference_err)?;

        let (_, value) = outputs.iter().next().ok_or_else(|| Error::Inference {
            reason: "model produced no outputs".to_string(),
        })?;
        let (shape, data) = value.try_extract_tensor::<f32>().map_err(inference_err)?;

        split_rows(shape, data, n)
    }
}

/// Split a flat `(N, C)` output into `N` rows of `C` logits.
fn split_rows(shape: &[i64], data: &[f32], expected_rows: usize) -> Result<Vec<Vec<f32>>> {
    let rows = shape
        .first()
        .and_then(|&r| usize::try_from(r).ok())
        .unwrap_or(0);
    if shape.len() != 2 || rows != expected_rows || data.is_empty() {
        return Err(Error::Inference {
            reason: format!("expected output shape ({expected_rows}, C), got {shape:?}"),
        });
    }

    let classes = data.len() / rows;
    Ok(data.chunks_exact(classes).map(<[f32]>::to_vec).collect())
}
