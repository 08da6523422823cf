//! Error types for rclone operations.

use thiserror::Error;

/// Errors that can occur while driving rclone.
#[derive(Debug, Error)]
pub enum Error {
    /// The rclone binary could not be executed
    #[error("rclone not found ({0}). Install it from https://rclone.org/install/")]
    NotFound(String),

    /// rclone ran but exited unsuccessfully
    #[error("command failed: {command} (exit code {code:?}): {stderr}")]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Trimmed standard error output
        stderr: String,
    },

    /// A `remote:path` string could not be parsed
    #[error("invalid remote path: {0}")]
    InvalidRemotePath(String),

    /// `rclone size --json` produced an unparseable payload
    #[error("could not parse size output: {0}")]
    SizeParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for rclone operations
pub type Result<T> = std::result::Result<T, Error>;
