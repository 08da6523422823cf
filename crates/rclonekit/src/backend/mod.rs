//! Backend abstraction for rclone operations.
//!
//! The [`Backend`] trait is the seam between the orchestration layer and the
//! rclone process, allowing for different implementations (real CLI,
//! scripted backends for testing).

pub mod cli;

use crate::error::Result;
use crate::stream::LineStream;
use crate::types::{CommandOutput, CopyOptions, RemotePath};

/// Backend trait for rclone operations.
pub trait Backend: Send + Sync {
    /// Check if the rclone executable can be run.
    fn is_available(&self) -> bool;

    /// List the top-level directories of a remote (`rclone lsd remote:`).
    /// Errors when the remote is unreachable.
    fn list_dirs(&self, remote: &str) -> Result<()>;

    /// Create a directory, succeeding if it already exists (`rclone mkdir`).
    fn mkdir(&self, path: &RemotePath) -> Result<()>;

    /// Raw JSON payload of `rclone size --json`.
    fn size_json(&self, path: &RemotePath) -> Result<String>;

    /// Run `rclone copy` to completion and capture its output.
    /// A non-zero exit is reported in the output, not as an error.
    fn copy(
        &self,
        source: &RemotePath,
        dest: &RemotePath,
        options: &CopyOptions,
    ) -> Result<CommandOutput>;

    /// Start `rclone copy` and stream its merged output line by line.
    fn copy_streaming(
        &self,
        source: &RemotePath,
        dest: &RemotePath,
        options: &CopyOptions,
    ) -> Result<Box<dyn LineStream>>;

    /// Run `rclone check` and capture its output.
    /// A non-zero exit is reported in the output, not as an error.
    fn check(
        &self,
        source: &RemotePath,
        dest: &RemotePath,
        one_way: bool,
    ) -> Result<CommandOutput>;
}
