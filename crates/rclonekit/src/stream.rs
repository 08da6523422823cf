//! Line-by-line streaming of a running child process.
//!
//! stdout and stderr are read on two helper threads and merged into a single
//! channel, so the caller sees one ordered-as-received stream of lines.
//! [`LineStream::poll`] waits for the next line at most for a given timeout,
//! which lets the caller check for cancellation between lines.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::{Error, Result};

/// Result of one [`LineStream::poll`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Next output line, without its line terminator
    Line(String),
    /// Nothing arrived within the timeout
    Idle,
    /// The process closed its output
    Closed,
}

/// A synchronous stream of output lines that ends when the process closes
/// its output. [`LineStream::wait`] then reaps the process.
pub trait LineStream: Iterator<Item = String> {
    /// Wait up to `timeout` for the next line.
    fn poll(&mut self, timeout: Duration) -> StreamEvent;

    /// Stop the process. Later polls report [`StreamEvent::Closed`].
    fn cancel(&mut self);

    /// Wait for the process to exit and return its exit code
    /// (`None` when terminated by a signal).
    fn wait(self: Box<Self>) -> Result<Option<i32>>;
}

/// [`LineStream`] over a spawned child with merged stdout/stderr.
pub struct ProcessStream {
    child: Option<Child>,
    lines: Receiver<String>,
    readers: Vec<JoinHandle<()>>,
    cancelled: bool,
}

impl ProcessStream {
    /// Spawn `command` with piped stdout/stderr. stdin is inherited.
    pub fn spawn(mut command: Command) -> Result<Self> {
        let program = command.get_program().to_string_lossy().into_owned();
        let mut child = command
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::NotFound(program.clone())
                } else {
                    Error::Io(e)
                }
            })?;

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, tx));
        }

        log::debug!("Streaming output of {} (pid {})", program, child.id());

        Ok(Self {
            child: Some(child),
            lines: rx,
            readers,
            cancelled: false,
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(source: R, tx: Sender<String>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

impl Iterator for ProcessStream {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.cancelled {
            return None;
        }
        // Err means both readers hit EOF and dropped their senders
        self.lines.recv().ok()
    }
}

impl LineStream for ProcessStream {
    fn poll(&mut self, timeout: Duration) -> StreamEvent {
        if self.cancelled {
            return StreamEvent::Closed;
        }
        match self.lines.recv_timeout(timeout) {
            Ok(line) => StreamEvent::Line(line),
            Err(RecvTimeoutError::Timeout) => StreamEvent::Idle,
            Err(RecvTimeoutError::Disconnected) => StreamEvent::Closed,
        }
    }

    fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        if let Some(child) = self.child.as_mut() {
            log::debug!("Cancelling child process {}", child.id());
            if let Err(e) = child.kill() {
                log::debug!("Could not kill child process: {e}");
            }
        }
    }

    fn wait(mut self: Box<Self>) -> Result<Option<i32>> {
        // A grandchild may still hold the pipes after a cancel; leave its
        // readers detached instead of blocking on them.
        if self.cancelled {
            self.readers.clear();
        }
        for reader in self.readers.drain(..) {
            let _ = reader.join();
        }
        match self.child.take() {
            Some(mut child) => Ok(child.wait()?.code()),
            None => Ok(None),
        }
    }
}

impl Drop for ProcessStream {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            log::debug!("Killing unfinished child process {}", child.id());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
