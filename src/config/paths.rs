//! Where the configuration file lives.

use crate::constants::{APP_NAME, files::CONFIG_FILE};
use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Platform configuration directory.
///
/// - Linux: `~/.config/birdmel/`
/// - macOS: `~/Library/Application Support/birdmel/`
/// - Windows: `%APPDATA%\birdmel\`
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(Error::ConfigDirNotFound)
}

/// A resolved config file path and how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Named with `--config` or `BIRDMEL_CONFIG`.
    Explicit(PathBuf),
    /// `config.toml` in the platform config directory.
    Platform(PathBuf),
}

impl ConfigLocation {
    /// Prefer `explicit`, else the platform default.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Ok(Self::Explicit(path.to_path_buf())),
            None => Ok(Self::Platform(config_dir()?.join(CONFIG_FILE))),
        }
    }

    /// The config file path.
    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(path) | Self::Platform(path) => path,
        }
    }

    /// Whether the user named the file.
    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }
}
