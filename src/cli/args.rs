//! CLI argument definitions.

use crate::cli::validators::{parse_positive, parse_sample_rate, parse_seconds};
use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Log-mel feature extraction and species prediction for bird recordings.
#[derive(Debug, Parser)]
#[command(name = "birdmel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a feature dataset (one `.npy` per window) from labelled recordings.
    Features(FeaturesArgs),
    /// Predict the species of one or more recordings.
    Predict(PredictArgs),
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Options accepted before or after any subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = "BIRDMEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: trace+ORT debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable progress bars.
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Pipeline overrides.
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Overrides for config file pipeline settings.
#[derive(Debug, Default, Args)]
pub struct PipelineArgs {
    /// Target sample rate in Hz.
    #[arg(long, global = true, value_parser = parse_sample_rate)]
    pub sample_rate: Option<u32>,

    /// Window length in seconds.
    #[arg(long, global = true, value_parser = parse_seconds)]
    pub segment_duration: Option<f32>,

    /// Stride between windows in seconds.
    #[arg(long, global = true, value_parser = parse_seconds)]
    pub segment_hop: Option<f32>,

    /// FFT frame size.
    #[arg(long, global = true, value_parser = parse_positive)]
    pub n_fft: Option<usize>,

    /// STFT hop in samples.
    #[arg(long, global = true, value_parser = parse_positive)]
    pub hop_length: Option<usize>,

    /// Number of mel bands.
    #[arg(long, global = true, value_parser = parse_positive)]
    pub n_mels: Option<usize>,
}

/// Arguments for the `features` command.
#[derive(Debug, Args)]
pub struct FeaturesArgs {
    /// Dataset root directory.
    pub dataset: PathBuf,

    /// CSV with `species,path` columns (paths relative to the dataset root).
    /// Without it, each subdirectory of the root is one species.
    #[arg(short, long)]
    pub labels: Option<PathBuf>,

    /// Output directory for `<species>/<n>.npy` files.
    #[arg(short, long, default_value = "features")]
    pub output: PathBuf,

    /// Standardize written features (overrides `features.standardize_dataset`).
    #[arg(long)]
    pub standardize: bool,
}

/// Arguments for the `predict` command.
#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Input files or directories.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// ONNX model file (overrides `inference.model`).
    #[arg(short, long, env = "BIRDMEL_MODEL")]
    pub model: Option<PathBuf>,

    /// Class label file, one label per line (overrides `inference.classes`).
    #[arg(short, long, env = "BIRDMEL_CLASSES")]
    pub classes: Option<PathBuf>,

    /// Number of ranked classes to report.
    #[arg(short = 'k', long, value_parser = parse_positive)]
    pub top_k: Option<usize>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write a per-file CSV report.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Include every class's mean probability in JSON output.
    #[arg(long)]
    pub probabilities: bool,
}
