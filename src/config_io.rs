//! Runtime configuration I/O operations.
//!
//! This module contains system directory detection and config loading utilities
//! that require runtime dependencies (dirs, tracing).
//! These are separated from config.rs to allow schema-only builds.

use crate::config::{Config, ConfigError};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "termtoggle";
const CONFIG_FILE: &str = "config.json";

/// Default location of the user config file
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Default directory for log files
pub fn log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

/// Load the config from `path`, or from the user config path when `None`.
///
/// A missing file yields the defaults; an unreadable or invalid file is an error.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match user_config_path() {
            Some(p) => p,
            None => {
                tracing::debug!("No config directory on this platform, using defaults");
                return Ok(Config::default());
            }
        },
    };
    load_from_path(&path)
}

fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file {} not found, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let config: Config = serde_json::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

    config.validate()?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}
