//! Per-window logits -> one per-recording prediction.

use crate::error::{Error, Result};
use serde::Serialize;

/// One ranked class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassScore {
    /// Position in the class list.
    pub index: usize,
    /// Class label.
    pub label: String,
    /// Mean probability across windows.
    pub probability: f32,
}

/// Aggregated result for one recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Most probable class.
    pub label: String,
    /// Mean probability of [`Self::label`].
    pub confidence: f32,
    /// Highest-ranked classes, descending.
    pub top_k: Vec<ClassScore>,
    /// Mean probability of every class, in class order.
    #[serde(skip)]
    pub probabilities: Vec<f32>,
    /// Windows that contributed to the mean.
    pub windows_used: usize,
    /// Windows dropped before inference.
    pub windows_skipped: usize,
}

/// Softmax-mean aggregation over windows.
#[derive(Debug, Clone)]
pub struct Aggregator {
    classes: Vec<String>,
    top_k: usize,
}

impl Aggregator {
    /// Create an aggregator for `classes` (model output order).
    pub fn new(classes: Vec<String>, top_k: usize) -> Result<Self> {
        if classes.is_empty() {
            return Err(Error::ConfigValidation {
                message: "class list is empty".to_string(),
            });
        }
        if top_k == 0 {
            return Err(Error::ConfigValidation {
                message: "top_k must be at least 1".to_string(),
            });
        }
        Ok(Self { classes, top_k })
    }

    /// Class labels in model output order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Softmax each row, average, and rank.
    ///
    /// Ties resolve to the lowest class index for both top-1 and top-k.
    pub fn aggregate(&self, logits: &[Vec<f32>]) -> Result<Prediction> {
        if logits.is_empty() {
            return Err(Error::NoWindows);
        }

        let n_classes = self.classes.len();
        let mut sums = vec![0.0_f64; n_classes];

        for (window, row) in logits.iter().enumerate() {
            if row.len() != n_classes {
                return Err(Error::Inference {
                    reason: format!(
                        "window {window} has {} logits, expected {n_classes}",
                        row.len()
                    ),
                });
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(Error::Inference {
                    reason: format!("window {window} has non-finite logits"),
                });
            }

            for (sum, p) in sums.iter_mut().zip(softmax(row)) {
                *sum += p;
            }
        }

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let probabilities: Vec<f32> = sums
            .iter()
            .map(|s| (s / logits.len() as f64) as f32)
            .collect();

        let best = argmax(&probabilities);
        let top_k = self.rank(&probabilities);

        Ok(Prediction {
            label: self.classes[best].clone(),
            confidence: probabilities[best],
            top_k,
            probabilities,
            windows_used: logits.len(),
            windows_skipped: 0,
        })
    }

    fn rank(&self, probabilities: &[f32]) -> Vec<ClassScore> {
        let mut order: Vec<usize> = (0..probabilities.len()).collect();
        order.sort_by(|&a, &b| {
            probabilities[b]
                .total_cmp(&probabilities[a])
                .then(a.cmp(&b))
        });

        order
            .into_iter()
            .take(self.top_k.min(probabilities.len()))
            .map(|index| ClassScore {
                index,
                label: self.classes[index].clone(),
                probability: probabilities[index],
            })
            .collect()
    }
}

/// Numerically stable softmax, accumulated in `f64`.
fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f64> = logits
        .iter()
        .map(|&v| f64::from(v - max).exp())
        .collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Index of the first maximum.
fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max { (i, v) } else { (best, max) }
        })
        .0
}
