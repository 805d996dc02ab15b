//! Configuration loading and management.

mod file;
mod overrides;
mod paths;
mod types;
mod validate;

pub use file::{load_config, load_config_file, save_config};
pub use overrides::apply_overrides;
pub use paths::{ConfigLocation, config_dir};
pub use types::{AudioConfig, Config, FeatureConfig, InferenceConfig, SegmentConfig};
pub use validate::validate_config;
