//! Centralized path resolution for ferry
//!
//! # Environment Variables
//!
//! - `FERRY_CONFIG_DIR` - Override config directory
//! - `FERRY_LOG_DIR` - Override log directory (read by the CLI layer)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `FERRY_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/ferry` (if set)
//! 3. Platform default (`dirs::config_dir()/ferry`)

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "FERRY_CONFIG_DIR";

/// Config file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Log directory used when neither the CLI nor the config names one
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Get the ferry config directory path
pub fn config_dir() -> Result<PathBuf> {
    resolve_config_dir(
        std::env::var(ENV_CONFIG_DIR).ok(),
        std::env::var("XDG_CONFIG_HOME").ok(),
        dirs::config_dir(),
    )
}

fn resolve_config_dir(
    override_dir: Option<String>,
    xdg_config: Option<String>,
    platform: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        let path = expand(&dir);
        log::debug!("Using config dir from {}: {}", ENV_CONFIG_DIR, path.display());
        return Ok(path);
    }

    if let Some(xdg) = xdg_config {
        let path = PathBuf::from(xdg).join("ferry");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let base = platform.context("Could not determine config directory")?;
    Ok(base.join("ferry"))
}

/// Default config file location
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Expand `~` and environment variables in a path
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

/// Run log file name for a batch started at `timestamp`
pub fn run_log_path(log_dir: &Path, timestamp: &str) -> PathBuf {
    log_dir.join(format!("transfer_batch_{timestamp}.log"))
}

/// Per-folder log file name. Spaces become underscores.
pub fn folder_log_path(log_dir: &Path, folder: &str, timestamp: &str) -> PathBuf {
    log_dir.join(format!("{}-{}.log", folder.replace(' ', "_"), timestamp))
}
