//! Birdmel - log-mel feature extraction and species prediction for bird recordings.
//!
//! Recordings are decoded and resampled, cut into fixed-length overlapping
//! windows, turned into log-mel spectrogram matrices, and either written out
//! as a training dataset or batched through a classification model whose
//! per-window outputs are averaged into one prediction per recording.

#![warn(missing_docs)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod features;
pub mod inference;
pub mod output;
pub mod pipeline;

use clap::Parser;
use cli::{Cli, Command, ConfigAction, FeaturesArgs, GlobalArgs, PredictArgs};
use config::{
    Config, ConfigLocation, apply_overrides, load_config, save_config, validate_config,
};
use inference::{OnnxModel, read_labels};
use output::{
    JsonSettings, JsonWriter, OutputFormat, OutputWriter, PredictionRecord, STATUS_OK, TextWriter,
    progress,
};
use pipeline::{BatchOutcome, DatasetBuilder, Predictor, collect_input_files};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

pub use error::{Error, Result};

/// Main entry point for the birdmel CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet);

    let mut config = load_config(cli.global.config.as_deref())?;
    apply_overrides(&mut config, &cli.global.pipeline);
    apply_command_overrides(&mut config, &cli.command);
    validate_config(&config)?;

    match cli.command {
        Command::Features(args) => handle_features(&args, &cli.global, &config),
        Command::Predict(args) => handle_predict(&args, &cli.global, &config),
        Command::Config { action } => handle_config_command(action, &cli.global, &config),
    }
}

/// Fold subcommand-specific flags into the resolved configuration.
fn apply_command_overrides(config: &mut Config, command: &Command) {
    match command {
        Command::Features(args) => {
            if args.standardize {
                config.features.standardize_dataset = true;
            }
        }
        Command::Predict(args) => {
            if let Some(top_k) = args.top_k {
                config.inference.top_k = top_k;
            }
            if let Some(model) = &args.model {
                config.inference.model = Some(model.clone());
            }
            if let Some(classes) = &args.classes {
                config.inference.classes = Some(classes.clone());
            }
        }
        Command::Config { .. } => {}
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT is silenced by default; raise verbosity to surface its logs.
    let filter_str = if quiet {
        "warn,ort=off"
    } else {
        match verbose {
            0 => "info,ort=off",
            1 => "debug,ort=warn",
            2 => "trace,ort=info",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn progress_enabled(global: &GlobalArgs) -> bool {
    !global.quiet && !global.no_progress
}

/// Generate `<output>/<species>/<n>.npy` files for a labelled dataset.
fn handle_features(args: &FeaturesArgs, global: &GlobalArgs, config: &Config) -> Result<()> {
    let start = Instant::now();

    let entries = match &args.labels {
        Some(csv_path) => {
            info!("Reading dataset index: {}", csv_path.display());
            pipeline::read_label_index(csv_path, &args.dataset)?
        }
        None => pipeline::scan_species_dirs(&args.dataset)?,
    };
    if entries.is_empty() {
        return Err(Error::NoValidAudioFiles);
    }
    info!("Found {} recording(s) to process", entries.len());

    let builder = DatasetBuilder::new(config, &args.output)?;
    let pb = progress::create_progress(entries.len(), "recordings", progress_enabled(global));
    let summary = builder.build(&entries, pb.as_ref())?;
    progress::finish_progress(pb, "Complete");

    info!(
        "Complete: {} species, {} recordings ({} failed), {} feature files written, {} windows skipped in {:.2}s",
        summary.species,
        summary.recordings,
        summary.failed,
        summary.windows_written,
        summary.windows_skipped,
        start.elapsed().as_secs_f64()
    );
    info!("Report written to {}", summary.report_path.display());

    if summary.failed > 0 {
        warn!("{} recording(s) had errors", summary.failed);
    }
    Ok(())
}

/// Predict species for recordings and render the results to stdout.
fn handle_predict(args: &PredictArgs, global: &GlobalArgs, config: &Config) -> Result<()> {
    let start = Instant::now();

    let model_path = required_path(config.inference.model.as_ref(), "model", "inference.model")?;
    let classes_path =
        required_path(config.inference.classes.as_ref(), "classes", "inference.classes")?;

    let files = collect_input_files(&args.inputs)?;
    if files.is_empty() {
        return Err(Error::NoValidAudioFiles);
    }
    info!("Found {} audio file(s) to process", files.len());

    let classes = read_labels(classes_path)?;
    info!("Loaded {} class labels", classes.len());
    let model = OnnxModel::load(model_path)?;
    let predictor = Predictor::new(config, Box::new(model), classes)?;

    let pb = progress::create_progress(files.len(), "recordings", progress_enabled(global));
    let outcome = predictor.predict_files(&files, pb.as_ref());
    progress::finish_progress(pb, "Complete");

    let stdout = std::io::stdout().lock();
    let mut writer: Box<dyn OutputWriter> = match args.format {
        OutputFormat::Text => Box::new(TextWriter::new(stdout)),
        OutputFormat::Json => Box::new(JsonWriter::new(
            stdout,
            predictor.model_name(),
            JsonSettings {
                probabilities: args.probabilities,
                ..JsonSettings::from(config)
            },
        )),
    };
    writer.write_outcome(&outcome)?;

    if let Some(report) = &args.report {
        output::write_report(report, &prediction_records(&outcome))?;
        info!("Report written to {}", report.display());
    }

    info!(
        "Complete: {} predicted, {} failed in {:.2}s",
        outcome.succeeded(),
        outcome.failed(),
        start.elapsed().as_secs_f64()
    );
    if outcome.failed() > 0 {
        warn!("{} file(s) had errors", outcome.failed());
    }
    Ok(())
}

fn required_path<'a>(value: Option<&'a PathBuf>, flag: &str, key: &str) -> Result<&'a Path> {
    value
        .map(PathBuf::as_path)
        .ok_or_else(|| Error::ConfigValidation {
            message: format!("no {flag} specified (use --{flag} or set {key} in config)"),
        })
}

fn prediction_records(outcome: &BatchOutcome) -> Vec<PredictionRecord> {
    outcome
        .files
        .iter()
        .map(|file| match &file.result {
            Ok(p) => PredictionRecord {
                path: file.path.display().to_string(),
                status: STATUS_OK.to_string(),
                top1: p.label.clone(),
                confidence: Some(p.confidence),
                windows: p.windows_used,
                error: String::new(),
            },
            Err(e) => PredictionRecord {
                path: file.path.display().to_string(),
                status: e.kind().to_string(),
                top1: String::new(),
                confidence: None,
                windows: 0,
                error: e.to_string(),
            },
        })
        .collect()
}

fn handle_config_command(action: ConfigAction, global: &GlobalArgs, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let location = ConfigLocation::resolve(global.config.as_deref())?;
            let path = location.path();
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                save_config(&Config::default(), path)?;
                println!("Created configuration file: {}", path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let rendered =
                toml::to_string_pretty(config).map_err(|e| Error::ConfigSerialize { source: e })?;
            print!("{rendered}");
            Ok(())
        }
        ConfigAction::Path => {
            let location = ConfigLocation::resolve(global.config.as_deref())?;
            println!("{}", location.path().display());
            Ok(())
        }
    }
}
