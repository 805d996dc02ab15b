//! Audio decoding strategies.
//!
//! Each strategy turns a file into mono `f32` samples. The loader tries them
//! in order, so a file that symphonia refuses can still be read by the plain
//! WAV reader.

use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::trace;

/// Error type returned by a single decode strategy.
pub type DecodeError = Box<dyn std::error::Error + Send + Sync>;

/// Decoded audio data.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Audio samples as mono f32, nominally in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count of the source before downmixing.
    pub channels: usize,
}

/// A way of turning an audio file into samples.
pub trait AudioDecoder: Send + Sync {
    /// Short strategy name for logs and error reports.
    fn name(&self) -> &'static str;

    /// Decode the file at `path` to mono samples.
    fn decode(&self, path: &Path) -> std::result::Result<DecodedAudio, DecodeError>;
}

/// Decoder backed by symphonia's format probe and codec registry.
///
/// Handles WAV, FLAC, MP3, AAC/M4A and Ogg Vorbis.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn decode(&self, path: &Path) -> std::result::Result<DecodedAudio, DecodeError> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or("no audio tracks found")?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or("missing sample rate")?;
        let mut channels = track
            .codec_params
            .channels
            .map_or(1, symphonia::core::audio::Channels::count);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;

        let mut samples = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(Box::new(e)),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // A corrupt frame is recoverable: drop it and keep going.
                Err(SymphoniaError::DecodeError(reason)) => {
                    trace!("Skipping undecodable packet in {}: {reason}", path.display());
                    continue;
                }
                Err(e) => return Err(Box::new(e)),
            };

            let spec = *decoded.spec();
            channels = spec.channels.count().max(1);

            let needed = decoded.capacity() * channels;
            if sample_buf.as_ref().is_none_or(|buf| buf.capacity() < needed) {
                sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
            }
            if let Some(buf) = sample_buf.as_mut() {
                buf.copy_interleaved_ref(decoded);
                downmix_interleaved(buf.samples(), channels, &mut samples);
            }
        }

        if samples.is_empty() {
            return Err("decoded stream contains no samples".into());
        }

        Ok(DecodedAudio {
            samples,
            sample_rate,
            channels,
        })
    }
}

/// Plain RIFF/WAVE reader backed by hound.
///
/// Used when symphonia cannot make sense of a file, e.g. WAV files with
/// unusual header chunks.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavDecoder;

impl AudioDecoder for WavDecoder {
    fn name(&self) -> &'static str {
        "wav"
    }

    #[allow(clippy::cast_precision_loss)]
    fn decode(&self, path: &Path) -> std::result::Result<DecodedAudio, DecodeError> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels).max(1);

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = (1_i64 << spec.bits_per_sample.saturating_sub(1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        let mut samples = Vec::with_capacity(interleaved.len() / channels);
        downmix_interleaved(&interleaved, channels, &mut samples);

        if samples.is_empty() {
            return Err("WAV file contains no samples".into());
        }

        Ok(DecodedAudio {
            samples,
            sample_rate: spec.sample_rate,
            channels,
        })
    }
}

/// Average interleaved frames into mono and append them to `output`.
fn downmix_interleaved(interleaved: &[f32], channels: usize, output: &mut Vec<f32>) {
    if channels <= 1 {
        output.extend_from_slice(interleaved);
        return;
    }

    #[allow(clippy::cast_precision_loss)]
    let norm = channels as f32;
    output.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / norm),
    );
}

/// The default decode order: symphonia first, then the plain WAV reader.
pub fn default_decoders() -> Vec<Box<dyn AudioDecoder>> {
    vec![Box::new(SymphoniaDecoder), Box::new(WavDecoder)]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(path: &Path, channels: u16, frames: &[Vec<i16>]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &s in frame {
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_downmix_averages_channels() {
        let mut out = Vec::new();
        downmix_interleaved(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2, &mut out);
        assert_eq!(out, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let mut out = vec![0.25];
        downmix_interleaved(&[0.1, 0.2], 1, &mut out);
        assert_eq!(out, vec![0.25, 0.1, 0.2]);
    }

    #[test]
    fn test_wav_decoder_stereo_to_mono() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, &[vec![16384, 0], vec![-16384, -16384]]);

        let decoded = WavDecoder.decode(&path).unwrap();
        assert_eq!(decoded.sample_rate, 16_000);
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.samples.len(), 2);
        assert!((decoded.samples[0] - 0.25).abs() < 1e-4);
        assert!((decoded.samples[1] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_symphonia_decoder_reads_wav() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mono.wav");
        let frames: Vec<Vec<i16>> = (0..1600).map(|i| vec![(i % 100) as i16 * 100]).collect();
        write_wav(&path, 1, &frames);

        let decoded = SymphoniaDecoder.decode(&path).unwrap();
        assert_eq!(decoded.sample_rate, 16_000);
        assert_eq!(decoded.samples.len(), 1600);
    }

    #[test]
    fn test_decoders_reject_zero_byte_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.wav");
        std::fs::write(&path, b"").unwrap();

        assert!(SymphoniaDecoder.decode(&path).is_err());
        assert!(WavDecoder.decode(&path).is_err());
    }
}
