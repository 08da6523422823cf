//! Ctrl+C handling.
//!
//! rclone shares our process group, so a Ctrl+C reaches it directly and it
//! exits on its own. While a live transfer is streaming the guard is armed:
//! the signal is only recorded, the stream ends, and the stage runner reports
//! the interruption and moves on. At any other time Ctrl+C exits with 130.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Exit status for a Ctrl+C outside a live transfer (128 + SIGINT)
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Debug, Clone, Default)]
pub struct InterruptGuard {
    armed: Arc<AtomicBool>,
    tripped: Arc<AtomicBool>,
}

impl InterruptGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the process-wide Ctrl+C handler. Call once, from `main`.
    pub fn install(&self) -> Result<()> {
        let guard = self.clone();
        ctrlc::set_handler(move || {
            if !guard.on_signal() {
                eprintln!("\nInterrupted by user. Exiting (Ctrl-C)...");
                std::process::exit(EXIT_INTERRUPTED);
            }
        })
        .context("Error setting Ctrl-C handler")
    }

    /// Record a signal. Returns false when nothing is armed to absorb it.
    pub fn on_signal(&self) -> bool {
        if self.armed.load(Ordering::SeqCst) {
            self.tripped.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// Absorb Ctrl+C until the returned scope is dropped.
    pub fn arm(&self) -> ArmedScope<'_> {
        self.tripped.store(false, Ordering::SeqCst);
        self.armed.store(true, Ordering::SeqCst);
        ArmedScope { guard: self }
    }
}

/// Live-transfer window during which Ctrl+C is absorbed
pub struct ArmedScope<'a> {
    guard: &'a InterruptGuard,
}

impl ArmedScope<'_> {
    /// Whether Ctrl+C was pressed since the scope was armed
    pub fn interrupted(&self) -> bool {
        self.guard.tripped.load(Ordering::SeqCst)
    }
}

impl Drop for ArmedScope<'_> {
    fn drop(&mut self) {
        self.guard.armed.store(false, Ordering::SeqCst);
    }
}
