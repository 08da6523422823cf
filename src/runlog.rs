//! Batch run log.
//!
//! Every event goes to the console (color-coded) and to a colorless,
//! timestamped file that serves as the audit trail of the batch.

use anyhow::{Context, Result};
use chrono::Local;
use colored::{ColoredString, Colorize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
    Success,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Success => "SUCCESS",
        }
    }

    fn tag(self) -> ColoredString {
        let tag = format!("[{}]", self.label());
        match self {
            Level::Info => tag.blue(),
            Level::Warning => tag.yellow(),
            Level::Error => tag.red(),
            Level::Success => tag.green(),
        }
    }
}

pub struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
    quiet: bool,
}

impl RunLog {
    /// Create (or append to) the run log, creating its directory.
    /// `quiet` hides INFO events from the console; the file keeps them.
    pub fn create(path: &Path, quiet: bool) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open run log {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            quiet,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, msg: &str) {
        self.emit(Level::Info, msg, true);
    }

    pub fn warn(&self, msg: &str) {
        self.emit(Level::Warning, msg, true);
    }

    pub fn error(&self, msg: &str) {
        self.emit(Level::Error, msg, true);
    }

    pub fn success(&self, msg: &str) {
        self.emit(Level::Success, msg, true);
    }

    /// INFO event written to the file only
    pub fn record(&self, msg: &str) {
        self.emit(Level::Info, msg, false);
    }

    /// Blank line, rule, title, rule
    pub fn banner(&self, title: &str) {
        self.info("");
        self.info(&ui::rule());
        self.info(title);
        self.info(&ui::rule());
    }

    fn emit(&self, level: Level, msg: &str, echo: bool) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("{} - {} {}", timestamp, level.tag(), msg);

        {
            let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
            let clean = console::strip_ansi_codes(&line);
            if let Err(e) = writeln!(file, "{clean}") {
                log::warn!("Could not write run log {}: {}", self.path.display(), e);
            }
        }

        if !echo || (self.quiet && level == Level::Info) {
            return;
        }
        if level == Level::Error {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}
