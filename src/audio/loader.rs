//! Recording loader: decode with fallbacks, downmix, sanitize, resample.

use crate::audio::decode::{AudioDecoder, DecodedAudio, default_decoders};
use crate::audio::resample;
use crate::error::{DecodeAttempt, Error, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Mono audio at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Samples, finite by construction when produced by [`AudioLoader`].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Waveform {
    /// Duration in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Loads recordings into [`Waveform`]s at a fixed target rate.
///
/// Decode strategies are tried in order until one succeeds.
pub struct AudioLoader {
    decoders: Vec<Box<dyn AudioDecoder>>,
    target_rate: u32,
}

impl std::fmt::Debug for AudioLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioLoader")
            .field(
                "decoders",
                &self.decoders.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .field("target_rate", &self.target_rate)
            .finish()
    }
}

impl AudioLoader {
    /// Loader with the default strategy order (symphonia, then WAV).
    pub fn new(target_rate: u32) -> Self {
        Self::with_decoders(target_rate, default_decoders())
    }

    /// Loader with a custom, ordered list of decode strategies.
    pub fn with_decoders(target_rate: u32, decoders: Vec<Box<dyn AudioDecoder>>) -> Self {
        Self {
            decoders,
            target_rate,
        }
    }

    /// Target sample rate in Hz.
    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Load a recording as mono audio at the target rate.
    pub fn load(&self, path: &Path) -> Result<Waveform> {
        let decoded = self.decode_with_fallback(path)?;
        debug!(
            "Decoded {} ({} ch, {} Hz, {} samples)",
            path.display(),
            decoded.channels,
            decoded.sample_rate,
            decoded.samples.len()
        );

        let mut samples = decoded.samples;
        let replaced = sanitize(&mut samples);
        if replaced > 0 {
            warn!(
                "Replaced {} non-finite samples with silence in {}",
                replaced,
                path.display()
            );
        }

        let samples = if decoded.sample_rate == self.target_rate {
            samples
        } else {
            debug!(
                "Resampling from {} Hz to {} Hz...",
                decoded.sample_rate, self.target_rate
            );
            resample(samples, decoded.sample_rate, self.target_rate)?
        };

        Ok(Waveform {
            samples,
            sample_rate: self.target_rate,
        })
    }

    fn decode_with_fallback(&self, path: &Path) -> Result<DecodedAudio> {
        let mut attempts = Vec::new();

        for decoder in &self.decoders {
            match decoder.decode(path) {
                Ok(decoded) if decoded.sample_rate == 0 => attempts.push(DecodeAttempt {
                    strategy: decoder.name(),
                    error: "reported a sample rate of 0 Hz".into(),
                }),
                Ok(decoded) => {
                    if !attempts.is_empty() {
                        debug!(
                            "Decoded {} with fallback strategy '{}'",
                            path.display(),
                            decoder.name()
                        );
                    }
                    return Ok(decoded);
                }
                Err(error) => {
                    debug!(
                        "Decode strategy '{}' failed for {}: {}",
                        decoder.name(),
                        path.display(),
                        error
                    );
                    attempts.push(DecodeAttempt {
                        strategy: decoder.name(),
                        error,
                    });
                }
            }
        }

        Err(Error::AudioLoad {
            path: path.to_path_buf(),
            attempts,
        })
    }
}

/// Replace NaN and infinite samples with zero, returning how many changed.
pub fn sanitize(samples: &mut [f32]) -> usize {
    let mut replaced = 0;
    for s in samples.iter_mut().filter(|s| !s.is_finite()) {
        *s = 0.0;
        replaced += 1;
    }
    replaced
}
