//! CSV run reports.

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Write `rows` as a CSV file with a header row.
pub fn write_report<R: Serialize>(path: &Path, rows: &[R]) -> Result<()> {
    let report_err = |e: csv::Error| Error::ReportWrite {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OutputDirCreateFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(report_err)?;
    for row in rows {
        writer.serialize(row).map_err(report_err)?;
    }
    writer
        .flush()
        .map_err(|e| report_err(csv::Error::from(e)))
}

/// Read header-keyed CSV rows (dataset indexes and reports).
pub fn read_csv<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let read_err = |e: csv::Error| Error::DatasetRead {
        path: path.to_path_buf(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_err)?;

    reader
        .deserialize()
        .collect::<std::result::Result<Vec<R>, _>>()
        .map_err(read_err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::output::{FeatureRecord, PredictionRecord};
    use tempfile::TempDir;

    #[test]
    fn test_feature_report_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("features_log.csv");
        let rows = vec![
            FeatureRecord {
                species: "Turdus merula".to_string(),
                path: "blackbird/a.wav".to_string(),
                status: "ok".to_string(),
                windows: 5,
                written: 5,
                skipped_windows: 0,
                error: String::new(),
            },
            FeatureRecord {
                species: "Turdus merula".to_string(),
                path: "blackbird/b.wav".to_string(),
                status: "audio_load_error".to_string(),
                windows: 0,
                written: 0,
                skipped_windows: 0,
                error: "failed to load audio, truncated".to_string(),
            },
        ];

        write_report(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("species,path,status,windows,written,skipped_windows,error\n"));
        assert!(text.contains("\"failed to load audio, truncated\""));

        let back: Vec<FeatureRecord> = read_csv(&path).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn test_prediction_report_empty_confidence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("predictions.csv");
        let rows = vec![PredictionRecord {
            path: "x.wav".to_string(),
            status: "empty_result".to_string(),
            top1: String::new(),
            confidence: None,
            windows: 0,
            error: "no usable windows".to_string(),
        }];
        write_report(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("x.wav,empty_result,,,0,no usable windows"));
    }
}
