//! Path safety checks.
//!
//! Every folder and subpath must resolve below the allow-listed migration
//! root. Checks run before any rclone process is started.

use rclonekit::RemotePath;
use thiserror::Error;

use crate::runlog::RunLog;
use crate::ui;

/// Segment every source and destination base must contain
pub const ALLOWED_ROOT: &str = "WASABI-MIGRATION";

/// A path that would leave the migration root
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Subpath '{0}' contains disallowed path characters")]
    Subpath(String),

    #[error("Folder name '{0}' contains disallowed path characters")]
    Folder(String),

    #[error("Path '{0}' is outside the allowed {root} root", root = ALLOWED_ROOT)]
    OutsideRoot(String),
}

/// Subpaths are relative and never climb: no leading `/`, no `..`.
pub fn check_subpath(subpath: &str) -> Result<(), PathError> {
    if subpath.starts_with('/') || subpath.starts_with('\\') || subpath.contains("..") {
        return Err(PathError::Subpath(subpath.to_string()));
    }
    Ok(())
}

/// Folder names are a single segment: no separator, no `..`, no leading dot.
pub fn check_folder(folder: &str) -> Result<(), PathError> {
    if folder.trim().is_empty()
        || folder.contains('/')
        || folder.contains('\\')
        || folder.contains("..")
        || folder.starts_with('.')
    {
        return Err(PathError::Folder(folder.to_string()));
    }
    Ok(())
}

/// A base path must contain the allow-listed segment.
pub fn check_base(base: &RemotePath) -> Result<(), PathError> {
    if base.has_segment(ALLOWED_ROOT) {
        Ok(())
    } else {
        Err(PathError::OutsideRoot(base.to_string()))
    }
}

/// Validate a whole request: the subpath first, then every folder.
pub fn check_request<S: AsRef<str>>(subpath: &str, folders: &[S]) -> Result<(), PathError> {
    check_subpath(subpath)?;
    folders.iter().try_for_each(|f| check_folder(f.as_ref()))
}

/// Print what this run will and will not do, before anything happens
pub fn log_safety_banner(log: &RunLog, source: &RemotePath, dest: &RemotePath) {
    log.info("");
    log.info(&ui::rule());
    log.info("SAFETY CHECK - This run will ONLY:");
    log.info(&format!(
        "1. Copy files from {} to {}",
        source.root(),
        dest.root()
    ));
    log.info(&format!("2. Only target the {ALLOWED_ROOT} folder"));
    log.info("3. Only use the safe 'copy' command (never sync, move, or delete)");
    log.info("4. Run in DRY RUN mode first for safety");
    log.info("5. Verify all transfers with checksums where possible");
    log.info(&ui::rule());
}
