//! # rclonekit
//!
//! A Rust library for driving the [rclone](https://rclone.org) CLI.
//!
//! rclone does all of the actual work (listing, copying, checksumming,
//! comparing). This crate builds its command lines, captures or streams its
//! output and interprets the few bits of that output callers depend on:
//!
//! - `rclone size --json` → [`SizeSummary`]
//! - `rclone check` → [`CheckReport`] (pass/fail)
//! - `rclone copy --progress` lines → [`status::StatusKind`]
//!
//! ## Safety
//!
//! Only non-destructive rclone operations are exposed: `lsd`, `mkdir`,
//! `size`, `copy` and `check`. There is no `sync`, `move` or `delete`.
//!
//! ## Example
//!
//! ```no_run
//! use rclonekit::{Client, CopyOptions, RemotePath};
//!
//! let client = Client::new();
//! let src = RemotePath::parse("dropbox:/Archive/Photos").unwrap();
//! let dst = RemotePath::parse("nas:/Backups/Archive/Photos").unwrap();
//!
//! client.mkdir(&dst).unwrap();
//! let preview = client.copy(&src, &dst, &CopyOptions::default().preview()).unwrap();
//! println!("{}", preview.stdout);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

/// Backend implementations for rclone operations.
pub mod backend;
/// Error types for rclone operations.
pub mod error;
pub mod status;
pub mod stream;
/// Common types: remote paths, copy options, captured output.
pub mod types;

pub use error::{Error, Result};
pub use status::{StatusKind, classify};
pub use stream::{LineStream, StreamEvent};
pub use types::{CheckReport, CommandOutput, CopyOptions, RemotePath, SizeSummary};

use backend::Backend;

/// High-level client for rclone operations.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client that runs `rclone` from `PATH`.
    pub fn new() -> Self {
        Self::with_binary(backend::cli::DEFAULT_BINARY)
    }

    /// Create a client that runs the given rclone executable.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            backend: Box::new(backend::cli::RcloneBackend::new(binary)),
        }
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Check that the rclone executable can be run.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Check that a remote answers a directory listing.
    pub fn list_dirs(&self, remote: &str) -> Result<()> {
        self.backend.list_dirs(remote)
    }

    /// Create a directory. Succeeds if it already exists.
    pub fn mkdir(&self, path: &RemotePath) -> Result<()> {
        self.backend.mkdir(path)
    }

    /// Total bytes and file count below `path`.
    pub fn size(&self, path: &RemotePath) -> Result<SizeSummary> {
        let payload = self.backend.size_json(path)?;
        SizeSummary::from_json(&payload)
    }

    /// Run a copy to completion and capture its output.
    pub fn copy(
        &self,
        source: &RemotePath,
        dest: &RemotePath,
        options: &CopyOptions,
    ) -> Result<CommandOutput> {
        self.backend.copy(source, dest, options)
    }

    /// Start a copy and stream its output.
    pub fn copy_streaming(
        &self,
        source: &RemotePath,
        dest: &RemotePath,
        options: &CopyOptions,
    ) -> Result<Box<dyn LineStream>> {
        self.backend.copy_streaming(source, dest, options)
    }

    /// Compare `source` against `dest` in one direction: every source file
    /// must exist and match at the destination.
    pub fn check_one_way(&self, source: &RemotePath, dest: &RemotePath) -> Result<CheckReport> {
        let output = self.backend.check(source, dest, true)?;
        Ok(CheckReport::from_output(output))
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
