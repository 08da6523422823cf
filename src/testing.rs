//! Scripted stand-ins for rclone and the terminal, shared by unit tests.

use rclonekit::backend::Backend;
use rclonekit::{CommandOutput, CopyOptions, LineStream, RemotePath, StreamEvent};
use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::confirm::Prompt;
use crate::interrupt::InterruptGuard;

/// Shared, ordered record of backend calls
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.snapshot()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

/// Backend that answers from fields instead of running rclone
#[derive(Default)]
pub struct ScriptedBackend {
    /// Remotes (`name:`) whose listing fails
    pub unreachable: Vec<String>,
    /// Folder names whose mkdir fails
    pub mkdir_fails: Vec<String>,
    /// Payload for `size --json`; a valid 3-file payload when `None`
    pub size_payload: Option<String>,
    /// Captured stdout of the dry run
    pub dry_run_stdout: String,
    /// Lines streamed by the live transfer
    pub transfer_lines: Vec<String>,
    /// Exit code of the live transfer
    pub transfer_exit: i32,
    /// Simulate Ctrl+C during the live transfer
    pub interrupt: Option<InterruptGuard>,
    /// Lines delivered before the simulated Ctrl+C; all of them when `None`
    pub interrupt_after: Option<usize>,
    /// Make `check` report differences
    pub check_differs: bool,
    /// Make `check` fail to run at all
    pub check_fails: bool,
    /// Pretend the rclone binary is not installed
    pub engine_missing: bool,
    pub calls: CallLog,
    pub made_dirs: Arc<Mutex<BTreeSet<String>>>,
}

impl ScriptedBackend {
    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    pub fn made_dirs(&self) -> Arc<Mutex<BTreeSet<String>>> {
        Arc::clone(&self.made_dirs)
    }
}

impl Backend for ScriptedBackend {
    fn is_available(&self) -> bool {
        !self.engine_missing
    }

    fn list_dirs(&self, remote: &str) -> rclonekit::Result<()> {
        self.calls.push(format!("lsd {remote}"));
        if self.unreachable.iter().any(|r| r == remote) {
            return Err(rclonekit::Error::CommandFailed {
                command: format!("rclone lsd {remote}"),
                code: Some(1),
                stderr: "didn't find section in config file".to_string(),
            });
        }
        Ok(())
    }

    fn mkdir(&self, path: &RemotePath) -> rclonekit::Result<()> {
        self.calls.push(format!("mkdir {path}"));
        if self.mkdir_fails.iter().any(|f| path.path().ends_with(f.as_str())) {
            return Err(rclonekit::Error::CommandFailed {
                command: format!("rclone mkdir {path}"),
                code: Some(1),
                stderr: "permission denied".to_string(),
            });
        }
        self.made_dirs.lock().unwrap().insert(path.to_string());
        Ok(())
    }

    fn size_json(&self, path: &RemotePath) -> rclonekit::Result<String> {
        self.calls.push(format!("size {path}"));
        Ok(self
            .size_payload
            .clone()
            .unwrap_or_else(|| r#"{"count":3,"bytes":3145728,"sizeless":0}"#.to_string()))
    }

    fn copy(
        &self,
        source: &RemotePath,
        dest: &RemotePath,
        options: &CopyOptions,
    ) -> rclonekit::Result<CommandOutput> {
        let mode = if options.dry_run { "copy --dry-run" } else { "copy" };
        self.calls.push(format!("{mode} {source} {dest}"));
        Ok(CommandOutput {
            command: format!("rclone {mode}"),
            stdout: self.dry_run_stdout.clone(),
            stderr: String::new(),
            code: Some(0),
        })
    }

    fn copy_streaming(
        &self,
        source: &RemotePath,
        dest: &RemotePath,
        _options: &CopyOptions,
    ) -> rclonekit::Result<Box<dyn LineStream>> {
        self.calls.push(format!("copy {source} {dest}"));
        Ok(Box::new(ScriptedStream {
            lines: self.transfer_lines.iter().cloned().collect(),
            delivered: 0,
            trip_at: self.interrupt_after.unwrap_or(self.transfer_lines.len()),
            code: Some(self.transfer_exit),
            interrupt: self.interrupt.clone(),
            calls: self.calls.clone(),
        }))
    }

    fn check(
        &self,
        source: &RemotePath,
        dest: &RemotePath,
        _one_way: bool,
    ) -> rclonekit::Result<CommandOutput> {
        self.calls.push(format!("check {source} {dest}"));
        if self.check_fails {
            return Err(rclonekit::Error::Io(std::io::Error::other(
                "check could not be started",
            )));
        }
        let (stderr, code) = if self.check_differs {
            ("ERROR : a.txt: sizes differ\nNOTICE: 1 differences found\n", 1)
        } else {
            ("NOTICE: 0 differences found\n", 0)
        };
        Ok(CommandOutput {
            command: "rclone check".to_string(),
            stdout: String::new(),
            stderr: stderr.to_string(),
            code: Some(code),
        })
    }
}

struct ScriptedStream {
    lines: VecDeque<String>,
    delivered: usize,
    trip_at: usize,
    code: Option<i32>,
    interrupt: Option<InterruptGuard>,
    calls: CallLog,
}

impl Iterator for ScriptedStream {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            match self.poll(Duration::ZERO) {
                StreamEvent::Line(line) => return Some(line),
                StreamEvent::Idle => {}
                StreamEvent::Closed => return None,
            }
        }
    }
}

impl LineStream for ScriptedStream {
    fn poll(&mut self, _timeout: Duration) -> StreamEvent {
        if self.delivered == self.trip_at {
            if let Some(guard) = self.interrupt.take() {
                guard.on_signal();
                // rclone dies on the same Ctrl+C
                self.code = None;
                return StreamEvent::Idle;
            }
        }
        match self.lines.pop_front() {
            Some(line) => {
                self.delivered += 1;
                StreamEvent::Line(line)
            }
            None => StreamEvent::Closed,
        }
    }

    fn cancel(&mut self) {
        self.calls.push("cancel".to_string());
        self.lines.clear();
        self.code = None;
    }

    fn wait(self: Box<Self>) -> rclonekit::Result<Option<i32>> {
        Ok(self.code)
    }
}

/// Prompt that always gives the same answer and remembers the questions
pub struct ScriptedPrompt {
    answer: String,
    pub asked: RefCell<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            asked: RefCell::new(Vec::new()),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&self, question: &str) -> anyhow::Result<String> {
        self.asked.borrow_mut().push(question.to_string());
        Ok(self.answer.clone())
    }
}
