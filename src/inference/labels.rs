//! Class label file reading.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read class labels from file.
///
/// # File Format
/// - One label per line, in model output order
/// - Surrounding whitespace is trimmed
/// - Blank lines are ignored
///
/// # Errors
/// - Returns error if file cannot be read
/// - Returns error if file contains invalid UTF-8
pub fn read_labels(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| Error::LabelsRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut labels = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| Error::LabelsRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let trimmed = line.trim();
        if !trimmed.is_empty() {
            labels.push(trimmed.to_string());
        }
    }

    Ok(labels)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_labels_keeps_order_and_skips_blanks() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Turdus merula").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  Erithacus rubecula  ").unwrap();
        writeln!(file, "Fringilla coelebs").unwrap();

        let labels = read_labels(file.path()).unwrap();
        assert_eq!(
            labels,
            vec!["Turdus merula", "Erithacus rubecula", "Fringilla coelebs"]
        );
    }

    #[test]
    fn test_read_labels_file_not_found() {
        let result = read_labels(Path::new("nonexistent.txt"));
        assert!(matches!(result, Err(Error::LabelsRead { .. })));
    }
}
