//! Live status panel for a running transfer.
//!
//! The panel is a fixed block of [`PANEL_HEIGHT`] terminal lines that is
//! repainted in place each time rclone prints a recognised status line:
//!
//! ```text
//! Status: Transferred:   1.2 GiB / 4 GiB, 30%, 9.8 MiB/s, ETA 4m52s
//! Files: Transferred:   12 / 40, 30%
//! Time: Elapsed time:   2m5.0s
//!   * IMG_0042.jpg: 64% /12.1Mi, 2.0Mi/s, 2s
//! ```
//!
//! Lines are cut to the terminal width so nothing wraps; a wrapped line would
//! push the block down and the next repaint would overwrite the wrong rows.

use console::Term;
use crossterm::cursor::MoveUp;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use rclonekit::StatusKind;
use rclonekit::status;
use std::io::{self, Write};

/// Number of rows owned by the panel
pub const PANEL_HEIGHT: usize = 4;

/// Width assumed when the terminal cannot report one
const FALLBACK_WIDTH: usize = 80;

/// Text shown in the current-file slot for the `Transferring:` header
const CURRENT_FILES_HEADER: &str = "Current files:";

fn slot_for(kind: StatusKind) -> Option<usize> {
    match kind {
        StatusKind::AggregateSummary => Some(0),
        StatusKind::FileSummary => Some(1),
        StatusKind::ElapsedTime => Some(2),
        StatusKind::CurrentFile => Some(3),
        StatusKind::Unclassified => None,
    }
}

/// The four slots: summary, files, time, current file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    slots: [Option<String>; PANEL_HEIGHT],
}

impl PanelState {
    pub fn reset(&mut self) {
        self.slots = Default::default();
    }

    /// Store `line` in the slot for `kind`. Returns false (and changes
    /// nothing) for unclassified lines.
    pub fn update(&mut self, kind: StatusKind, line: &str) -> bool {
        let Some(slot) = slot_for(kind) else {
            return false;
        };

        let line = status::clean(line);
        let text = match kind {
            StatusKind::AggregateSummary => format!("Status: {line}"),
            StatusKind::FileSummary => format!("Files: {line}"),
            StatusKind::ElapsedTime => format!("Time: {line}"),
            StatusKind::CurrentFile if status::is_activity_header(&line) => {
                CURRENT_FILES_HEADER.to_string()
            }
            StatusKind::CurrentFile => format!("  {line}"),
            StatusKind::Unclassified => return false,
        };
        self.slots[slot] = Some(text);
        true
    }

    /// Exactly [`PANEL_HEIGHT`] display lines, blank where a slot is empty,
    /// each at most `width - 1` columns wide.
    pub fn frame(&self, width: usize) -> [String; PANEL_HEIGHT] {
        let max = width.saturating_sub(1).max(4);
        self.slots.each_ref().map(|slot| match slot {
            Some(text) => console::truncate_str(text, max, "...").into_owned(),
            None => String::new(),
        })
    }

    #[cfg(test)]
    pub fn is_blank(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Consumer of classified status lines during a live transfer.
pub trait StatusSink {
    /// Reset the slots and reserve the display region.
    fn begin(&mut self) -> io::Result<()>;

    /// Apply one line. Unclassified lines are ignored.
    fn update(&mut self, kind: StatusKind, line: &str) -> io::Result<()>;

    /// Release the display region.
    fn finish(&mut self) -> io::Result<()>;
}

/// In-place repainting panel. After the first write error it stops drawing
/// for the rest of the stage, so a broken terminal is never scribbled on.
pub struct TerminalPanel<W: Write> {
    out: W,
    state: PanelState,
    width: usize,
    disabled: bool,
}

impl TerminalPanel<io::Stdout> {
    /// Panel on stdout, sized to the current terminal
    pub fn stdout() -> Self {
        let width = match Term::stdout().size_checked() {
            Some((_, cols)) if cols > 0 => usize::from(cols),
            _ => FALLBACK_WIDTH,
        };
        Self::new(io::stdout(), width)
    }
}

impl<W: Write> TerminalPanel<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            state: PanelState::default(),
            width,
            disabled: false,
        }
    }

    #[cfg(test)]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    #[cfg(test)]
    pub fn state(&self) -> &PanelState {
        &self.state
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Move back over the panel, clear it, draw all slots
    fn repaint(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            MoveUp(PANEL_HEIGHT as u16),
            Clear(ClearType::FromCursorDown)
        )?;
        for line in self.state.frame(self.width) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }

    fn guarded(&mut self, op: impl FnOnce(&mut Self) -> io::Result<()>) -> io::Result<()> {
        if self.disabled {
            return Ok(());
        }
        op(self).inspect_err(|_| self.disabled = true)
    }
}

impl<W: Write> StatusSink for TerminalPanel<W> {
    fn begin(&mut self) -> io::Result<()> {
        self.state.reset();
        self.disabled = false;
        self.guarded(|panel| {
            panel.out.write_all("\n".repeat(PANEL_HEIGHT).as_bytes())?;
            panel.out.flush()
        })
    }

    fn update(&mut self, kind: StatusKind, line: &str) -> io::Result<()> {
        if self.disabled || !self.state.update(kind, line) {
            return Ok(());
        }
        self.guarded(Self::repaint)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.guarded(|panel| {
            writeln!(panel.out)?;
            panel.out.flush()
        })
    }
}

/// Log-only sink for non-interactive output. Nothing is drawn; the folder
/// log already holds every line.
#[derive(Debug, Default)]
pub struct PlainPanel {
    state: PanelState,
}

impl StatusSink for PlainPanel {
    fn begin(&mut self) -> io::Result<()> {
        self.state.reset();
        Ok(())
    }

    fn update(&mut self, kind: StatusKind, line: &str) -> io::Result<()> {
        if self.state.update(kind, line) && kind == StatusKind::AggregateSummary {
            log::info!("{}", status::clean(line));
        }
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Terminal panel when stdout is a terminal, plain sink otherwise
pub fn for_stdout() -> Box<dyn StatusSink> {
    if Term::stdout().is_term() {
        Box::new(TerminalPanel::stdout())
    } else {
        Box::new(PlainPanel::default())
    }
}
