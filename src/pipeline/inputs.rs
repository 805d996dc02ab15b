//! Input discovery and output naming.

use crate::constants::AUDIO_EXTENSIONS;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Characters that cannot appear in a directory name on common filesystems.
const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Collect audio files from paths (files and directories).
///
/// Directories are scanned recursively; the result is sorted per directory so
/// runs are reproducible.
pub fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_audio_file(path) {
                files.push(path.clone());
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            collect_audio_files_recursive(path, &mut files)?;
        } else {
            warn!("Skipping non-existent path: {}", path.display());
        }
    }

    Ok(files)
}

/// Recursively collect audio files from a directory.
pub(crate) fn collect_audio_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_audio_files_recursive(&path, files)?;
        } else if is_audio_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// Check if a file has a supported audio extension.
pub fn is_audio_file(path: &Path) -> bool {
    // OsStr comparison keeps non-UTF-8 names working.
    path.extension().is_some_and(|ext| {
        AUDIO_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}

/// Turn a species label into a safe single directory name.
///
/// Reserved characters become `_`, whitespace runs collapse to one `_`.
pub fn sanitize_dir_name(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut in_space = false;

    for c in label.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if RESERVED.contains(&c) || c.is_control() {
            out.push('_');
        } else {
            out.push(c);
        }
    }

    match out.as_str() {
        "" | "." | ".." => "_".repeat(out.len().max(1)),
        _ => out,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("test.wav")));
        assert!(is_audio_file(Path::new("test.FLAC")));
        assert!(is_audio_file(Path::new("test.mp3")));
        assert!(is_audio_file(Path::new("test.ogg")));
        assert!(!is_audio_file(Path::new("test.txt")));
        assert!(!is_audio_file(Path::new("wav")));
    }

    #[test]
    fn test_is_audio_file_with_unicode() {
        assert!(is_audio_file(Path::new("sabiá_laranjeira.wav")));
        assert!(is_audio_file(Path::new("テスト.flac")));
    }

    #[test]
    fn test_collect_recurses_and_sorts() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("b");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("c.wav"), b"").unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::write(nested.join("x.flac"), b"").unwrap();

        let files = collect_input_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.mp3", "b/x.flac", "c.wav"]);
    }

    #[test]
    fn test_collect_skips_missing_paths() {
        let files = collect_input_files(&[PathBuf::from("/nonexistent/dir")]).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_sanitize_dir_name() {
        assert_eq!(sanitize_dir_name("Turdus rufiventris"), "Turdus_rufiventris");
        assert_eq!(sanitize_dir_name("  a \t  b "), "a_b");
        assert_eq!(sanitize_dir_name("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_dir_name("Bem-te-vi"), "Bem-te-vi");
        assert_eq!(sanitize_dir_name(".."), "__");
        assert_eq!(sanitize_dir_name(""), "_");
    }
}
