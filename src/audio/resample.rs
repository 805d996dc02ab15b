//! Audio resampling using rubato.

use crate::error::{Error, Result};
use audioadapter_buffers::direct::SequentialSlice;
use rubato::{Fft, FixedSync, Resampler};

/// Input frames fed to the resampler per call.
const CHUNK_SIZE: usize = 1024;

/// Resample mono audio to the target sample rate.
///
/// Returns the input unchanged if already at the target rate. Otherwise the
/// output holds exactly `ceil(len * to_rate / from_rate)` samples.
pub fn resample(samples: Vec<f32>, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples);
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(Error::Resample {
            reason: format!("invalid sample rates {from_rate} -> {to_rate}"),
        });
    }

    let mut resampler = Fft::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_SIZE,
        1,
        1,
        FixedSync::Both,
    )
    .map_err(|e| Error::Resample {
        reason: e.to_string(),
    })?;

    let frames_per_call = resampler.input_frames_next();
    let delay = resampler.output_delay();
    let expected = output_len(samples.len(), from_rate, to_rate);
    let mut output = Vec::with_capacity(delay + expected + CHUNK_SIZE);

    // Zero-pad the tail to a whole number of calls; the surplus is trimmed below.
    let mut padded = samples;
    let calls = padded.len().div_ceil(frames_per_call);
    padded.resize(calls * frames_per_call, 0.0);

    for chunk in padded.chunks_exact(frames_per_call) {
        process_chunk(&mut resampler, chunk, &mut output)?;
    }

    // Flush until the delayed tail of the input has come out of the filter.
    let silence = vec![0.0; frames_per_call];
    while output.len() < delay + expected {
        let before = output.len();
        process_chunk(&mut resampler, &silence, &mut output)?;
        if output.len() == before {
            break;
        }
    }

    // The first `delay` frames precede the first input sample.
    output.drain(..delay.min(output.len()));
    output.resize(expected, 0.0);
    Ok(output)
}

fn process_chunk(resampler: &mut Fft<f32>, chunk: &[f32], output: &mut Vec<f32>) -> Result<()> {
    let input = SequentialSlice::new(chunk, 1, chunk.len()).map_err(|e| Error::Resample {
        reason: format!("failed to create input adapter: {e}"),
    })?;

    let resampled = resampler
        .process(&input, 0, None)
        .map_err(|e| Error::Resample {
            reason: e.to_string(),
        })?;

    output.extend_from_slice(&resampled.take_data());
    Ok(())
}

/// Number of output samples for `input_len` samples converted between rates.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn output_len(input_len: usize, from_rate: u32, to_rate: u32) -> usize {
    ((input_len as f64) * f64::from(to_rate) / f64::from(from_rate)).ceil() as usize
}
