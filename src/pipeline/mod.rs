//! Processing pipelines built on the audio, feature, and inference stages.

mod dataset;
mod extract;
mod inputs;
mod predictor;

pub use dataset::{
    DatasetBuilder, DatasetEntry, DatasetSummary, read_label_index, scan_species_dirs,
};
pub use extract::{FeaturePipeline, RecordingFeatures};
pub use inputs::{collect_input_files, is_audio_file, sanitize_dir_name};
pub use predictor::{BatchOutcome, FileOutcome, Predictor};
