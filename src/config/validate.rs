//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};

/// Validate the entire configuration.
///
/// Runs before any recording is touched so bad settings fail fast.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_audio(config)?;
    validate_segment(config)?;
    validate_features(config)?;
    validate_inference(config)?;
    Ok(())
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

fn validate_audio(config: &Config) -> Result<()> {
    if config.audio.sample_rate == 0 {
        return Err(invalid("audio.sample_rate must be positive"));
    }
    Ok(())
}

fn validate_segment(config: &Config) -> Result<()> {
    let segment = &config.segment;
    let sr = f64::from(config.audio.sample_rate);

    if !(segment.duration.is_finite() && segment.duration > 0.0) {
        return Err(invalid(format!(
            "segment.duration must be positive, got {}",
            segment.duration
        )));
    }
    if !(segment.hop.is_finite() && segment.hop > 0.0) {
        return Err(invalid(format!(
            "segment.hop must be positive, got {}",
            segment.hop
        )));
    }

    // Both must survive rounding to whole samples.
    if (f64::from(segment.duration) * sr).round() < 1.0 {
        return Err(invalid(format!(
            "segment.duration {}s is shorter than one sample",
            segment.duration
        )));
    }
    if (f64::from(segment.hop) * sr).round() < 1.0 {
        return Err(invalid(format!(
            "segment.hop {}s is shorter than one sample",
            segment.hop
        )));
    }

    Ok(())
}

fn validate_features(config: &Config) -> Result<()> {
    let features = &config.features;

    if features.n_fft == 0 {
        return Err(invalid("features.n_fft must be positive"));
    }
    if features.hop_length == 0 {
        return Err(invalid("features.hop_length must be positive"));
    }
    if features.n_mels == 0 {
        return Err(invalid("features.n_mels must be positive"));
    }
    if !(features.top_db.is_finite() && features.top_db > 0.0) {
        return Err(invalid(format!(
            "features.top_db must be positive, got {}",
            features.top_db
        )));
    }

    Ok(())
}

fn validate_inference(config: &Config) -> Result<()> {
    if config.inference.top_k == 0 {
        return Err(invalid("inference.top_k must be at least 1"));
    }
    Ok(())
}
