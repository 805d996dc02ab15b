//! Audio loading and windowing.

mod decode;
mod loader;
mod resample;
mod segment;

pub use decode::{
    AudioDecoder, DecodeError, DecodedAudio, SymphoniaDecoder, WavDecoder, default_decoders,
};
pub use loader::{AudioLoader, Waveform, sanitize};
pub use resample::{output_len as resampled_len, resample};
pub use segment::{Segmenter, Window};
