//! Configuration file loading and saving.

use crate::config::{Config, ConfigLocation};
use crate::error::{Error, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Load configuration from a TOML file.
///
/// Returns default config if the file does not exist. Missing sections and
/// keys take their defaults.
pub fn load_config_file(path: &Path) -> Result<Config> {
    Ok(read_config(path)?.unwrap_or_default())
}

/// Load configuration from `explicit` or the platform-specific path.
///
/// Falls back to defaults when no platform config directory exists.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let location = match ConfigLocation::resolve(explicit) {
        Ok(location) => location,
        Err(Error::ConfigDirNotFound) => {
            debug!("No platform config directory, using defaults");
            return Ok(Config::default());
        }
        Err(e) => return Err(e),
    };

    match read_config(location.path())? {
        Some(config) => {
            debug!("Loaded config from {}", location.path().display());
            Ok(config)
        }
        None if location.is_explicit() => {
            warn!(
                "Config file {} does not exist, using defaults",
                location.path().display()
            );
            Ok(Config::default())
        }
        None => Ok(Config::default()),
    }
}

/// Parse `path`, or `None` when there is no such file.
fn read_config(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        debug!("No config file at {}", path.display());
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents)
        .map(Some)
        .map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Save configuration to a TOML file, creating parent directories.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let write_err = |e: std::io::Error| Error::ConfigWrite {
        path: path.to_path_buf(),
        source: e,
    };

    let contents =
        toml::to_string_pretty(config).map_err(|e| Error::ConfigSerialize { source: e })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, contents).map_err(write_err)
}
