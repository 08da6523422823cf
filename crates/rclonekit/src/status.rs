//! Classification of rclone `--progress` output.
//!
//! rclone prints periodic stats blocks such as:
//!
//! ```text
//! Transferred:        1.200 GiB / 4.000 GiB, 30%, 9.8 MiB/s, ETA 4m52s
//! Transferred:           12 / 40, 30%
//! Elapsed time:       2m5.0s
//! Transferring:
//!  *                   IMG_0042.jpg: 64% /12.1Mi, 2.0Mi/s, 2s
//! ```
//!
//! The format is not versioned, so every rule here is a substring test and
//! anything unrecognised is [`StatusKind::Unclassified`].

use std::borrow::Cow;

/// Marker of a transfer tally line.
pub const TALLY_MARKER: &str = "Transferred:";
/// Marker of an estimated time remaining.
pub const ETA_MARKER: &str = "ETA";
/// Marker of the elapsed time line.
pub const ELAPSED_MARKER: &str = "Elapsed time:";
/// Header that opens the list of in-flight files.
pub const ACTIVITY_HEADER: &str = "Transferring:";
/// Prefix of one in-flight file line.
pub const ACTIVITY_PREFIX: char = '*';

/// Category of one output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// Byte tally with ETA
    AggregateSummary,
    /// File tally without ETA
    FileSummary,
    /// Elapsed time
    ElapsedTime,
    /// In-flight file, or the header above the in-flight list
    CurrentFile,
    /// Anything else
    Unclassified,
}

impl StatusKind {
    /// True for every category that feeds the status panel.
    pub fn is_status(self) -> bool {
        self != Self::Unclassified
    }
}

/// Strip ANSI escape sequences and surrounding whitespace.
pub fn clean(line: &str) -> Cow<'_, str> {
    match console::strip_ansi_codes(line) {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim()),
        Cow::Owned(s) => Cow::Owned(s.trim().to_string()),
    }
}

/// Classify one line. Total and deterministic.
pub fn classify(line: &str) -> StatusKind {
    let line = clean(line);

    if line.contains(TALLY_MARKER) {
        if line.contains(ETA_MARKER) {
            StatusKind::AggregateSummary
        } else {
            StatusKind::FileSummary
        }
    } else if line.contains(ELAPSED_MARKER) {
        StatusKind::ElapsedTime
    } else if line.starts_with(ACTIVITY_PREFIX) || line.contains(ACTIVITY_HEADER) {
        StatusKind::CurrentFile
    } else {
        StatusKind::Unclassified
    }
}

/// True for the `Transferring:` header rather than an in-flight file.
pub fn is_activity_header(line: &str) -> bool {
    let line = clean(line);
    !line.starts_with(ACTIVITY_PREFIX) && line.contains(ACTIVITY_HEADER)
}

/// Last aggregate summary line in a captured run, cleaned.
pub fn last_aggregate_summary(output: &str) -> Option<String> {
    output
        .lines()
        .rev()
        .find(|line| classify(line) == StatusKind::AggregateSummary)
        .map(|line| clean(line).into_owned())
}
