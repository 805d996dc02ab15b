//! Run report row types.

use serde::{Deserialize, Serialize};

/// Status value for items that completed.
pub const STATUS_OK: &str = "ok";

/// One row of the dataset generation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Species label from the dataset index.
    pub species: String,
    /// Recording path.
    pub path: String,
    /// `ok` or an error kind.
    pub status: String,
    /// Windows produced by segmentation.
    pub windows: usize,
    /// Feature files written.
    pub written: usize,
    /// Windows dropped after a feature extraction failure.
    pub skipped_windows: usize,
    /// Error message, empty on success.
    pub error: String,
}

/// One row of the prediction report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Recording path.
    pub path: String,
    /// `ok` or an error kind.
    pub status: String,
    /// Most probable class, empty on failure.
    pub top1: String,
    /// Mean probability of `top1`.
    pub confidence: Option<f32>,
    /// Windows that contributed.
    pub windows: usize,
    /// Error message, empty on success.
    pub error: String,
}
