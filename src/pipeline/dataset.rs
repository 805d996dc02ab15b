//! Dataset generation: one `.npy` feature file per window, grouped by species.

use crate::config::Config;
use crate::constants::files::{FEATURE_EXTENSION, FEATURES_REPORT};
use crate::error::{Error, Result};
use crate::features::Normalization;
use crate::output::{self, FeatureRecord, STATUS_OK, progress};
use crate::pipeline::inputs::{collect_audio_files_recursive, sanitize_dir_name};
use crate::pipeline::{FeaturePipeline, RecordingFeatures};
use indicatif::ProgressBar;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One labelled recording.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetEntry {
    /// Species label.
    pub species: String,
    /// Recording path.
    pub path: PathBuf,
}

/// Read a `species,path` labels CSV; relative paths resolve against `root`.
pub fn read_label_index(csv_path: &Path, root: &Path) -> Result<Vec<DatasetEntry>> {
    let entries: Vec<DatasetEntry> = output::read_csv(csv_path)?;
    Ok(entries
        .into_iter()
        .map(|e| DatasetEntry {
            path: root.join(&e.path),
            species: e.species,
        })
        .collect())
}

/// Treat every subdirectory of `root` as one species.
///
/// Species are sorted by directory name; audio is collected recursively.
pub fn scan_species_dirs(root: &Path) -> Result<Vec<DatasetEntry>> {
    let mut dirs = std::fs::read_dir(root)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    dirs.retain(|p| p.is_dir());
    dirs.sort();

    let mut entries = Vec::new();
    for dir in dirs {
        let Some(species) = dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let mut files = Vec::new();
        collect_audio_files_recursive(&dir, &mut files)?;
        if files.is_empty() {
            warn!("No audio files for species {species}");
        }
        entries.extend(files.into_iter().map(|path| DatasetEntry {
            species: species.clone(),
            path,
        }));
    }

    if entries.is_empty() {
        return Err(Error::NoValidAudioFiles);
    }
    Ok(entries)
}

/// Totals for one dataset run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    /// Recordings attempted.
    pub recordings: usize,
    /// Recordings that failed entirely or partway through writing.
    pub failed: usize,
    /// Species directories produced. Labels that sanitize alike count once.
    pub species: usize,
    /// Feature files written.
    pub windows_written: usize,
    /// Windows dropped after a feature extraction failure.
    pub windows_skipped: usize,
    /// Location of the per-recording report.
    pub report_path: PathBuf,
}

/// Writes `<output>/<species>/<n>.npy` for every window of every recording.
#[derive(Debug)]
pub struct DatasetBuilder {
    pipeline: FeaturePipeline,
    normalization: Normalization,
    output_dir: PathBuf,
}

impl DatasetBuilder {
    /// Build from configuration, writing under `output_dir`.
    pub fn new(config: &Config, output_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_pipeline(
            FeaturePipeline::from_config(config)?,
            config,
            output_dir,
        ))
    }

    /// Build with an already constructed feature pipeline.
    pub fn with_pipeline(
        pipeline: FeaturePipeline,
        config: &Config,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pipeline,
            normalization: Normalization::from_flag(config.features.standardize_dataset),
            output_dir: output_dir.into(),
        }
    }

    /// Output root.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Process every entry, then write the run report.
    ///
    /// Species are handled in order of first appearance. Numbering starts at 1
    /// per species and advances once per written file. A recording that fails
    /// is reported and skipped.
    pub fn build(&self, entries: &[DatasetEntry], pb: Option<&ProgressBar>) -> Result<DatasetSummary> {
        let groups = group_by_species(entries);
        let mut records = Vec::with_capacity(entries.len());
        let mut summary = DatasetSummary {
            recordings: entries.len(),
            failed: 0,
            species: groups.len(),
            windows_written: 0,
            windows_skipped: 0,
            report_path: self.output_dir.join(FEATURES_REPORT),
        };

        for (dir_name, group) in groups {
            info!("Processing species {dir_name} ({} recordings)", group.len());
            let species_dir = self.output_dir.join(&dir_name);
            std::fs::create_dir_all(&species_dir).map_err(|e| Error::OutputDirCreateFailed {
                path: species_dir.clone(),
                source: e,
            })?;

            let mut next_index = 1;
            for entry in group {
                progress::set_message(pb, &entry.path.display().to_string());
                let record = self.process_entry(entry, &species_dir, &mut next_index);
                if record.status != STATUS_OK {
                    summary.failed += 1;
                }
                summary.windows_written += record.written;
                summary.windows_skipped += record.skipped_windows;
                records.push(record);
                progress::inc_progress(pb);
            }
        }

        output::write_report(&summary.report_path, &records)?;
        Ok(summary)
    }

    fn process_entry(
        &self,
        entry: &DatasetEntry,
        species_dir: &Path,
        next_index: &mut usize,
    ) -> FeatureRecord {
        let mut record = FeatureRecord {
            species: entry.species.clone(),
            path: entry.path.display().to_string(),
            status: STATUS_OK.to_string(),
            windows: 0,
            written: 0,
            skipped_windows: 0,
            error: String::new(),
        };

        let extracted = match self.pipeline.process(&entry.path, self.normalization) {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!("Skipping {}: {e}", entry.path.display());
                record.status = e.kind().to_string();
                record.error = e.to_string();
                return record;
            }
        };

        record.windows = extracted.windows;
        record.skipped_windows = extracted.skipped;

        if extracted.features.is_empty() {
            let e = Error::EmptyResult {
                path: entry.path.clone(),
            };
            warn!("Skipping {}: {e}", entry.path.display());
            record.status = e.kind().to_string();
            record.error = e.to_string();
            return record;
        }

        if let Err(e) = write_features(&extracted, species_dir, next_index, &mut record.written) {
            warn!("Failed writing features for {}: {e}", entry.path.display());
            record.status = e.kind().to_string();
            record.error = e.to_string();
        }

        debug!(
            "{}: wrote {} of {} windows",
            entry.path.display(),
            record.written,
            record.windows
        );
        record
    }
}

fn write_features(
    extracted: &RecordingFeatures,
    species_dir: &Path,
    next_index: &mut usize,
    written: &mut usize,
) -> Result<()> {
    for (_, matrix) in &extracted.features {
        let path = species_dir.join(format!("{next_index}.{FEATURE_EXTENSION}"));
        output::write_npy(&path, matrix)?;
        *next_index += 1;
        *written += 1;
    }
    Ok(())
}

/// Group entries by output directory name, preserving first-appearance order.
///
/// Labels that sanitize to the same name share one group so their files are
/// numbered in a single sequence.
fn group_by_species(entries: &[DatasetEntry]) -> Vec<(String, Vec<&DatasetEntry>)> {
    let mut groups: Vec<(String, Vec<&DatasetEntry>)> = Vec::new();
    for entry in entries {
        let dir_name = sanitize_dir_name(&entry.species);
        match groups.iter_mut().find(|(d, _)| *d == dir_name) {
            Some((_, group)) => {
                if group.iter().all(|e| e.species != entry.species) {
                    warn!(
                        "Species {:?} shares directory {dir_name} with {:?}",
                        entry.species, group[0].species
                    );
                }
                group.push(entry);
            }
            None => groups.push((dir_name, vec![entry])),
        }
    }
    groups
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(path: &Path, samples: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..samples {
            writer.write_sample(i16::try_from(i % 300).unwrap() * 50).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn entry(species: &str, path: &Path) -> DatasetEntry {
        DatasetEntry {
            species: species.to_string(),
            path: path.to_path_buf(),
        }
    }

    #[test]
    fn test_group_by_species_keeps_first_appearance_order() {
        let entries = vec![
            entry("b", Path::new("1.wav")),
            entry("a", Path::new("2.wav")),
            entry("b", Path::new("3.wav")),
        ];
        let groups = group_by_species(&entries);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "b");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "a");
    }

    #[test]
    fn test_group_by_species_merges_labels_with_the_same_directory() {
        let entries = vec![
            entry("Turdus rufiventris", Path::new("1.wav")),
            entry("Turdus_rufiventris", Path::new("2.wav")),
        ];
        let groups = group_by_species(&entries);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, "Turdus_rufiventris");
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn test_numbering_continues_across_recordings() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("audio");
        std::fs::create_dir(&audio).unwrap();
        // 4.5 s -> 2 windows, 3 s -> 1 window.
        write_wav(&audio.join("a.wav"), 99_225);
        write_wav(&audio.join("b.wav"), 66_150);
        write_wav(&audio.join("c.wav"), 66_150);

        let entries = vec![
            entry("Turdus rufiventris", &audio.join("a.wav")),
            entry("Pitangus sulphuratus", &audio.join("c.wav")),
            entry("Turdus rufiventris", &audio.join("b.wav")),
        ];

        let out = dir.path().join("features");
        let builder = DatasetBuilder::new(&Config::default(), &out).unwrap();
        let summary = builder.build(&entries, None).unwrap();

        assert_eq!(summary.recordings, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.species, 2);
        assert_eq!(summary.windows_written, 4);

        let turdus = out.join("Turdus_rufiventris");
        for n in 1..=3 {
            assert!(turdus.join(format!("{n}.npy")).is_file());
        }
        assert!(!turdus.join("4.npy").exists());
        assert!(out.join("Pitangus_sulphuratus/1.npy").is_file());

        let matrix = output::read_npy(&turdus.join("1.npy")).unwrap();
        assert_eq!(matrix.shape(), (128, 130));
    }

    #[test]
    fn test_corrupt_recording_is_reported_and_skipped() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.wav");
        let bad = dir.path().join("bad.wav");
        write_wav(&good, 66_150);
        std::fs::write(&bad, b"RIFF garbage").unwrap();

        let out = dir.path().join("features");
        let builder = DatasetBuilder::new(&Config::default(), &out).unwrap();
        let summary = builder
            .build(&[entry("x", &bad), entry("x", &good)], None)
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.windows_written, 1);
        assert!(out.join("x/1.npy").is_file());

        let rows: Vec<FeatureRecord> = output::read_csv(&summary.report_path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, "audio_load_error");
        assert_eq!(rows[0].written, 0);
        assert_eq!(rows[1].status, STATUS_OK);
        assert_eq!(rows[1].written, 1);
    }

    #[test]
    fn test_labels_sharing_a_directory_do_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        // 4.5 s -> 2 windows, 3 s -> 1 window.
        write_wav(&a, 99_225);
        write_wav(&b, 66_150);

        let out = dir.path().join("features");
        let builder = DatasetBuilder::new(&Config::default(), &out).unwrap();
        let summary = builder
            .build(
                &[
                    entry("Turdus rufiventris", &a),
                    entry("Turdus_rufiventris", &b),
                ],
                None,
            )
            .unwrap();

        assert_eq!(summary.species, 1);
        assert_eq!(summary.windows_written, 3);
        let on_disk = std::fs::read_dir(out.join("Turdus_rufiventris"))
            .unwrap()
            .count();
        assert_eq!(on_disk, summary.windows_written);

        let rows: Vec<FeatureRecord> = output::read_csv(&summary.report_path).unwrap();
        assert_eq!(rows[0].species, "Turdus rufiventris");
        assert_eq!(rows[1].species, "Turdus_rufiventris");
    }

    #[test]
    fn test_recording_without_usable_windows_is_empty_result() {
        let dir = TempDir::new().unwrap();
        let loud = dir.path().join("loud.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        // Mel power overflows f32, so every window fails extraction.
        let mut writer = hound::WavWriter::create(&loud, spec).unwrap();
        for _ in 0..66_150 {
            writer.write_sample(1.0e30_f32).unwrap();
        }
        writer.finalize().unwrap();

        let out = dir.path().join("features");
        let builder = DatasetBuilder::new(&Config::default(), &out).unwrap();
        let summary = builder.build(&[entry("x", &loud)], None).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.windows_written, 0);
        assert_eq!(summary.windows_skipped, 1);

        let rows: Vec<FeatureRecord> = output::read_csv(&summary.report_path).unwrap();
        assert_eq!(rows[0].status, "empty_result");
        assert_eq!(rows[0].written, 0);
        assert!(!rows[0].error.is_empty());
    }

    #[test]
    fn test_read_label_index_resolves_against_root() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("labels.csv");
        std::fs::write(&csv_path, "species,path\nsabia, a/1.wav\nbem-te-vi,/abs/2.wav\n").unwrap();

        let entries = read_label_index(&csv_path, Path::new("/data")).unwrap();
        assert_eq!(entries[0], entry("sabia", Path::new("/data/a/1.wav")));
        assert_eq!(entries[1], entry("bem-te-vi", Path::new("/abs/2.wav")));
    }

    #[test]
    fn test_scan_species_dirs() {
        let dir = TempDir::new().unwrap();
        for species in ["b_species", "a_species"] {
            let d = dir.path().join(species).join("nested");
            std::fs::create_dir_all(&d).unwrap();
            std::fs::write(d.join("1.wav"), b"").unwrap();
        }
        std::fs::write(dir.path().join("stray.wav"), b"").unwrap();

        let entries = scan_species_dirs(dir.path()).unwrap();
        let species: Vec<&str> = entries.iter().map(|e| e.species.as_str()).collect();
        assert_eq!(species, vec!["a_species", "b_species"]);
    }

    #[test]
    fn test_scan_empty_root_has_no_audio() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            scan_species_dirs(dir.path()),
            Err(Error::NoValidAudioFiles)
        ));
    }
}
