//! Per-folder log of raw rclone output.
//!
//! Each phase is wrapped in marker lines so the file can be read (or
//! grepped) phase by phase:
//!
//! ```text
//! --- DRY RUN OUTPUT ---
//! ...
//! --- END DRY RUN OUTPUT ---
//! ```

use anyhow::{Context, Result};
use rclonekit::CommandOutput;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Phases recorded in the folder log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    DryRun,
    Transfer,
    Verification,
}

impl Section {
    fn title(self) -> &'static str {
        match self {
            Section::DryRun => "DRY RUN OUTPUT",
            Section::Transfer => "TRANSFER OUTPUT",
            Section::Verification => "VERIFICATION RESULTS",
        }
    }

    fn errors_label(self) -> &'static str {
        match self {
            Section::Verification => "VERIFICATION ERRORS:",
            _ => "ERRORS:",
        }
    }
}

pub struct FolderLog {
    path: PathBuf,
    file: File,
}

impl FolderLog {
    /// Open in append mode; re-runs of the same folder accumulate.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open folder log {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn begin(&mut self, section: Section) -> Result<()> {
        writeln!(self.file, "\n--- {} ---", section.title())?;
        Ok(())
    }

    pub fn end(&mut self, section: Section) -> Result<()> {
        writeln!(self.file, "\n--- END {} ---", section.title())?;
        self.file.flush()?;
        Ok(())
    }

    /// Append one streamed line verbatim
    pub fn line(&mut self, line: &str) -> Result<()> {
        writeln!(self.file, "{line}")?;
        Ok(())
    }

    /// Write a whole captured run as one section, stderr after stdout
    pub fn captured(&mut self, section: Section, output: &CommandOutput) -> Result<()> {
        self.begin(section)?;
        self.file.write_all(output.stdout.as_bytes())?;
        if !output.stderr.is_empty() {
            writeln!(self.file, "\n{}", section.errors_label())?;
            self.file.write_all(output.stderr.as_bytes())?;
        }
        self.end(section)
    }
}
