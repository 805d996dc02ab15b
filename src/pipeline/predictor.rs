//! Per-recording species prediction.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::features::{BatchAssembler, FeatureMatrix, Normalization};
use crate::inference::{Aggregator, Model, Prediction};
use crate::output::progress;
use crate::pipeline::FeaturePipeline;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// Outcome for one recording in a batch run.
#[derive(Debug)]
pub struct FileOutcome {
    /// Recording path.
    pub path: PathBuf,
    /// Prediction, or why there is none.
    pub result: Result<Prediction>,
}

/// Outcomes for every recording of a batch run, in input order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// One entry per input.
    pub files: Vec<FileOutcome>,
}

impl BatchOutcome {
    /// Successful predictions.
    pub fn predictions(&self) -> impl Iterator<Item = (&Path, &Prediction)> {
        self.files
            .iter()
            .filter_map(|f| f.result.as_ref().ok().map(|p| (f.path.as_path(), p)))
    }

    /// Failed recordings.
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &Error)> {
        self.files
            .iter()
            .filter_map(|f| f.result.as_ref().err().map(|e| (f.path.as_path(), e)))
    }

    /// Number of successful predictions.
    pub fn succeeded(&self) -> usize {
        self.predictions().count()
    }

    /// Number of failed recordings.
    pub fn failed(&self) -> usize {
        self.failures().count()
    }
}

/// Runs the full pipeline for recordings against an injected model.
pub struct Predictor {
    pipeline: FeaturePipeline,
    model: Box<dyn Model>,
    aggregator: Aggregator,
    normalization: Normalization,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("model", &self.model.name())
            .field("classes", &self.aggregator.classes().len())
            .field("normalization", &self.normalization)
            .finish_non_exhaustive()
    }
}

impl Predictor {
    /// Build a predictor from configuration, a model, and its class labels.
    pub fn new(config: &Config, model: Box<dyn Model>, classes: Vec<String>) -> Result<Self> {
        Self::with_pipeline(FeaturePipeline::from_config(config)?, config, model, classes)
    }

    /// Build with an already constructed feature pipeline.
    pub fn with_pipeline(
        pipeline: FeaturePipeline,
        config: &Config,
        model: Box<dyn Model>,
        classes: Vec<String>,
    ) -> Result<Self> {
        Ok(Self {
            pipeline,
            model,
            aggregator: Aggregator::new(classes, config.inference.top_k)?,
            normalization: Normalization::from_flag(config.features.standardize_inference),
        })
    }

    /// Name of the injected model.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Predict the species of one recording.
    pub fn predict_file(&self, path: &Path) -> Result<Prediction> {
        let start = Instant::now();
        let extracted = self.pipeline.process(path, self.normalization)?;

        if extracted.features.is_empty() {
            return Err(Error::EmptyResult {
                path: path.to_path_buf(),
            });
        }

        let matrices: Vec<FeatureMatrix> = extracted.features.into_iter().map(|(_, m)| m).collect();
        let batch = BatchAssembler.assemble(&matrices)?;
        debug!("Batch shape {:?} for {}", batch.shape(), path.display());

        let logits = self.model.predict(&batch)?;
        if logits.len() != batch.len() {
            return Err(Error::Inference {
                reason: format!(
                    "model returned {} rows for a batch of {}",
                    logits.len(),
                    batch.len()
                ),
            });
        }

        let mut prediction = self.aggregator.aggregate(&logits)?;
        prediction.windows_skipped = extracted.skipped;

        info!(
            "{}: {} ({:.4}) from {} windows in {:.2}s",
            path.display(),
            prediction.label,
            prediction.confidence,
            prediction.windows_used,
            start.elapsed().as_secs_f64()
        );

        Ok(prediction)
    }

    /// Predict every recording; a failing recording never aborts the run.
    pub fn predict_files(&self, paths: &[PathBuf], pb: Option<&ProgressBar>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for path in paths {
            progress::set_message(pb, &display_name(path));
            let result = self.predict_file(path);
            if let Err(e) = &result {
                error!("Failed to process {}: {}", path.display(), e);
            }
            outcome.files.push(FileOutcome {
                path: path.clone(),
                result,
            });
            progress::inc_progress(pb);
        }

        outcome
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
