//! Real rclone CLI backend using `rclone` commands.

use std::process::{Command, Output};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::stream::{LineStream, ProcessStream};
use crate::types::{CommandOutput, CopyOptions, RemotePath};

/// Binary looked up on `PATH` when none is configured.
pub const DEFAULT_BINARY: &str = "rclone";

/// Backend that executes real `rclone` commands.
pub struct RcloneBackend {
    /// Path or name of the rclone executable
    binary: String,
}

impl RcloneBackend {
    /// Create a backend for the given executable.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        cmd
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }

    /// Run rclone and capture its output, whatever the exit code.
    fn run(&self, args: &[String]) -> Result<CommandOutput> {
        let command = self.describe(args);
        log::debug!("Running: {}", command);

        let output: Output = self.command(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(self.binary.clone())
            } else {
                Error::Io(e)
            }
        })?;

        Ok(CommandOutput {
            command,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }

    /// Run rclone and turn a non-zero exit into [`Error::CommandFailed`].
    fn run_checked(&self, args: &[String]) -> Result<CommandOutput> {
        let output = self.run(args)?;
        if output.success() {
            Ok(output)
        } else {
            Err(Error::CommandFailed {
                command: output.command,
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}

/// Arguments for `rclone copy <src> <dst> [flags]`.
fn copy_args(source: &RemotePath, dest: &RemotePath, options: &CopyOptions) -> Vec<String> {
    let mut args = vec!["copy".to_string(), source.to_string(), dest.to_string()];
    args.extend(options.to_args());
    args
}

/// Arguments for `rclone check <src> <dst> [--one-way]`.
fn check_args(source: &RemotePath, dest: &RemotePath, one_way: bool) -> Vec<String> {
    let mut args = vec!["check".to_string(), source.to_string(), dest.to_string()];
    if one_way {
        args.push("--one-way".to_string());
    }
    args
}

impl Backend for RcloneBackend {
    fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn list_dirs(&self, remote: &str) -> Result<()> {
        self.run_checked(&["lsd".to_string(), remote.to_string()])
            .map(|_| ())
    }

    fn mkdir(&self, path: &RemotePath) -> Result<()> {
        self.run_checked(&["mkdir".to_string(), path.to_string()])
            .map(|_| ())
    }

    fn size_json(&self, path: &RemotePath) -> Result<String> {
        let output =
            self.run_checked(&["size".to_string(), path.to_string(), "--json".to_string()])?;
        Ok(output.stdout)
    }

    fn copy(
        &self,
        source: &RemotePath,
        dest: &RemotePath,
        options: &CopyOptions,
    ) -> Result<CommandOutput> {
        self.run(&copy_args(source, dest, options))
    }

    fn copy_streaming(
        &self,
        source: &RemotePath,
        dest: &RemotePath,
        options: &CopyOptions,
    ) -> Result<Box<dyn LineStream>> {
        let args = copy_args(source, dest, options);
        log::debug!("Streaming: {}", self.describe(&args));
        let stream = ProcessStream::spawn(self.command(&args))?;
        Ok(Box::new(stream))
    }

    fn check(
        &self,
        source: &RemotePath,
        dest: &RemotePath,
        one_way: bool,
    ) -> Result<CommandOutput> {
        self.run(&check_args(source, dest, one_way))
    }
}
