//! Progress indicators for ferry.
//!
//! Only the blocking, captured rclone runs (dry run, verification) get a
//! spinner; the live transfer has the status panel instead. indicatif hides
//! the spinner when stderr is not a terminal.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Start a spinner with `msg`
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Remove a spinner without leaving a line behind
pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}
