//! Model capability, class labels, and per-recording aggregation.

mod aggregate;
mod labels;
mod model;

pub use aggregate::{Aggregator, ClassScore, Prediction};
pub use labels::read_labels;
pub use model::{Model, OnnxModel};
