//! Application-wide constants.
//!
//! Defaults for every pipeline parameter live here. Components never read
//! these directly; they seed `Config::default()`.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "birdmel";

/// Default target sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Default window duration in seconds.
pub const DEFAULT_SEGMENT_DURATION: f32 = 3.0;

/// Default stride between window starts in seconds (50% overlap).
pub const DEFAULT_SEGMENT_HOP: f32 = 1.5;

/// Default number of top predictions to report per recording.
pub const DEFAULT_TOP_K: usize = 5;

/// Spectrogram parameters.
pub mod spectrogram {
    /// FFT frame size.
    pub const N_FFT: usize = 2048;

    /// Stride between STFT frames in samples.
    pub const HOP_LENGTH: usize = 512;

    /// Number of mel bands.
    pub const N_MELS: usize = 128;

    /// Dynamic range kept below the per-window peak, in dB.
    pub const TOP_DB: f32 = 80.0;

    /// Power floor applied before taking the logarithm.
    pub const AMIN: f32 = 1e-10;

    /// Added to the standard deviation during standardization.
    pub const STD_EPSILON: f32 = 1e-6;
}

/// Slaney mel scale constants.
pub mod mel_scale {
    /// Linear region slope (Hz per mel).
    pub const F_SP: f64 = 200.0 / 3.0;

    /// Frequency where the log region begins.
    pub const MIN_LOG_HZ: f64 = 1000.0;

    /// Log-region step size: ln(6.4) / 27.
    pub const LOG_STEP: f64 = 0.068_751_777_420_949_12;
}

/// Output file names and extensions.
pub mod files {
    /// Extension of serialized feature matrices.
    pub const FEATURE_EXTENSION: &str = "npy";

    /// Run report written next to generated features.
    pub const FEATURES_REPORT: &str = "features_log.csv";

    /// Config file name inside the config directory.
    pub const CONFIG_FILE: &str = "config.toml";
}

/// Supported audio file extensions for input collection.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "m4a", "aac", "ogg"];

/// Confidence value formatting.
pub mod confidence {
    /// Decimal places for confidence formatting.
    pub const DECIMAL_PLACES: usize = 4;
}
