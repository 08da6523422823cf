use serde::Deserialize;
use std::fmt;

use crate::error::{Error, Result};

/// Phrase rclone prints when `check` finds nothing to report, e.g.
/// `NOTICE: Local file system at /dst: 0 differences found`.
const DIFFERENCES_MARKER: &str = "differences found";

/// A location on an rclone remote, written `remote:path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    remote: String,
    path: String,
}

impl RemotePath {
    /// Parse a `remote:path` string. The remote name must be non-empty and
    /// must not contain a path separator.
    pub fn parse(s: &str) -> Result<Self> {
        let (remote, path) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidRemotePath(s.to_string()))?;

        if remote.is_empty() || remote.contains('/') || remote.contains('\\') {
            return Err(Error::InvalidRemotePath(s.to_string()));
        }

        Ok(Self {
            remote: remote.to_string(),
            path: path.to_string(),
        })
    }

    /// The remote name without the trailing colon.
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// The path part after the colon.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The remote root, `remote:`, used for reachability listings.
    pub fn root(&self) -> String {
        format!("{}:", self.remote)
    }

    /// Append one or more `/`-separated segments.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            return self.clone();
        }

        let path = if self.path.is_empty() || self.path.ends_with('/') {
            format!("{}{}", self.path, segment)
        } else {
            format!("{}/{}", self.path, segment)
        };

        Self {
            remote: self.remote.clone(),
            path,
        }
    }

    /// Returns true if one of the path's segments equals `segment`.
    pub fn has_segment(&self, segment: &str) -> bool {
        self.path.split('/').any(|s| s == segment)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.remote, self.path)
    }
}

/// Byte and file counts reported by `rclone size --json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SizeSummary {
    /// Total size in bytes
    #[serde(default)]
    pub bytes: u64,
    /// Number of files
    #[serde(default)]
    pub count: u64,
}

impl SizeSummary {
    /// Parse the JSON payload printed by `rclone size --json`.
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload.trim())?)
    }
}

/// Parameters for `rclone copy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOptions {
    /// Parallel file transfers (`--transfers`)
    pub transfers: u32,
    /// Parallel checkers (`--checkers`)
    pub checkers: u32,
    /// Transactions per second limit (`--tpslimit`)
    pub tps_limit: u32,
    /// Bandwidth limit, rclone syntax such as `10M` (`--bwlimit`)
    pub bw_limit: String,
    /// Interval between progress blocks, such as `15s` (`--stats`)
    pub stats_interval: String,
    /// Preview only, move no data (`--dry-run`)
    pub dry_run: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            transfers: 4,
            checkers: 8,
            tps_limit: 2,
            bw_limit: "10M".to_string(),
            stats_interval: "15s".to_string(),
            dry_run: false,
        }
    }
}

impl CopyOptions {
    /// Same parameters with dry-run switched on.
    pub fn preview(&self) -> Self {
        Self {
            dry_run: true,
            ..self.clone()
        }
    }

    /// Flags passed after `copy <src> <dst>`. Checksum comparison and
    /// progress output are always on.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(9);
        if self.dry_run {
            args.push("--dry-run".to_string());
        }
        args.push("--progress".to_string());
        args.push("--checksum".to_string());
        args.push(format!("--transfers={}", self.transfers));
        args.push(format!("--checkers={}", self.checkers));
        args.push(format!("--tpslimit={}", self.tps_limit));
        args.push(format!("--bwlimit={}", self.bw_limit));
        args.push(format!("--stats={}", self.stats_interval));
        args
    }
}

/// Captured result of one rclone invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Command line, for logging
    pub command: String,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
}

impl CommandOutput {
    /// True when the process exited with code 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Outcome of `rclone check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// Raw output of the check
    pub output: CommandOutput,
    /// Whether source and destination matched
    pub passed: bool,
}

impl CheckReport {
    /// Derive pass/fail from a captured check run: either rclone reported
    /// zero differences or it exited cleanly.
    pub fn from_output(output: CommandOutput) -> Self {
        let passed = reports_no_differences(&output.stdout)
            || reports_no_differences(&output.stderr)
            || output.success();
        Self { output, passed }
    }
}

/// True if some line reports exactly `0 differences found`.
/// `10 differences found` does not count.
pub fn reports_no_differences(text: &str) -> bool {
    text.lines().any(|line| {
        line.find(DIFFERENCES_MARKER).is_some_and(|idx| {
            line[..idx]
                .split(|c: char| c.is_whitespace() || c == ':')
                .rfind(|tok| !tok.is_empty())
                == Some("0")
        })
    })
}
