//! Command-line overrides of config file settings.

use crate::cli::PipelineArgs;
use crate::config::Config;

/// Apply CLI pipeline overrides on top of file settings.
///
/// Only flags that were given replace file values.
pub fn apply_overrides(config: &mut Config, args: &PipelineArgs) {
    if let Some(sample_rate) = args.sample_rate {
        config.audio.sample_rate = sample_rate;
    }
    if let Some(duration) = args.segment_duration {
        config.segment.duration = duration;
    }
    if let Some(hop) = args.segment_hop {
        config.segment.hop = hop;
    }
    if let Some(n_fft) = args.n_fft {
        config.features.n_fft = n_fft;
    }
    if let Some(hop_length) = args.hop_length {
        config.features.hop_length = hop_length;
    }
    if let Some(n_mels) = args.n_mels {
        config.features.n_mels = n_mels;
    }
}
