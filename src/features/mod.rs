//! Log-mel feature extraction and batching.

mod batch;
mod extractor;
mod matrix;
mod mel;

pub use batch::{Batch, BatchAssembler};
pub use extractor::{FeatureExtractor, Normalization, power_to_db};
pub use matrix::FeatureMatrix;
pub use mel::{MelFilterbank, MelSpectrogram, hz_to_mel, mel_to_hz};
