use anyhow::{Context, Result};
use rclonekit::RemotePath;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::guard;
use crate::paths;

/// Source base used when the config file does not name one
pub const DEFAULT_SOURCE_BASE: &str = "dropbox-wasabi-migration:/WASABI-MIGRATION";

/// Destination base used when the config file does not name one
pub const DEFAULT_DEST_BASE: &str = "DS423:/Backups/WASABI-MIGRATION";

// ============================================================================
// Config File
// ============================================================================

/// On-disk configuration (`config.toml`). Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub engine: Option<String>,
    pub log_dir: Option<String>,
    pub transfer: TransferDefaults,
}

/// Default rclone tuning, overridable per run from the CLI
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransferDefaults {
    pub transfers: u32,
    pub checkers: u32,
    pub tpslimit: u32,
    pub bwlimit: String,
    pub stats: String,
}

impl Default for TransferDefaults {
    fn default() -> Self {
        Self {
            transfers: 4,
            checkers: 8,
            tpslimit: 2,
            bwlimit: "10M".to_string(),
            stats: "15s".to_string(),
        }
    }
}

impl ConfigFile {
    /// Load a config file, failing if it is missing or malformed
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Load the explicit file if given, else the default location.
    /// A missing default file means built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let path = paths::config_file()?;
        if path.exists() {
            log::debug!("Loading config from {}", path.display());
            Self::load(&path)
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

// ============================================================================
// Migration Config
// ============================================================================

/// Immutable run configuration, built once in `main` and passed down.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub source_base: RemotePath,
    pub dest_base: RemotePath,
    pub engine: String,
    pub log_dir: PathBuf,
    pub transfer: TransferDefaults,
}

impl MigrationConfig {
    /// Resolve a config file into a validated run configuration.
    /// `log_dir` (from `--log-dir` / `FERRY_LOG_DIR`) beats the file.
    pub fn resolve(file: ConfigFile, log_dir: Option<PathBuf>) -> Result<Self> {
        let source_base = parse_base(file.source.as_deref().unwrap_or(DEFAULT_SOURCE_BASE))?;
        let dest_base = parse_base(file.destination.as_deref().unwrap_or(DEFAULT_DEST_BASE))?;

        let log_dir = log_dir.unwrap_or_else(|| {
            paths::expand(file.log_dir.as_deref().unwrap_or(paths::DEFAULT_LOG_DIR))
        });

        Ok(Self {
            source_base,
            dest_base,
            engine: file
                .engine
                .unwrap_or_else(|| rclonekit::backend::cli::DEFAULT_BINARY.to_string()),
            log_dir,
            transfer: file.transfer,
        })
    }

    /// Source and destination bases with the optional subpath applied
    pub fn bases(&self, subpath: &str) -> (RemotePath, RemotePath) {
        (self.source_base.join(subpath), self.dest_base.join(subpath))
    }
}

fn parse_base(raw: &str) -> Result<RemotePath> {
    let base = RemotePath::parse(raw).with_context(|| format!("Invalid base path '{raw}'"))?;
    guard::check_base(&base)?;
    Ok(base)
}
