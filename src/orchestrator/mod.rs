//! Batch orchestration: folders one at a time, in the order given, each
//! isolated from the others' failures.

pub mod folder_log;
pub mod stage;

use rclonekit::Client;

use crate::config::MigrationConfig;
use crate::confirm::Prompt;
use crate::interrupt::InterruptGuard;
use crate::panel::StatusSink;
use crate::request::TransferRequest;
use crate::runlog::RunLog;
use stage::{FolderJob, FolderOutcome};

/// Everything a batch needs, borrowed from `main` for the whole run
pub struct Batch<'a> {
    pub config: &'a MigrationConfig,
    pub request: &'a TransferRequest,
    pub client: &'a Client,
    pub log: &'a RunLog,
    pub prompt: &'a dyn Prompt,
    pub interrupt: &'a InterruptGuard,
    /// Builds a fresh status sink for each live transfer
    pub panel: &'a dyn Fn() -> Box<dyn StatusSink>,
    /// Batch start time, shared by every log file name
    pub timestamp: &'a str,
}

impl Batch<'_> {
    /// Process every requested folder, then print the closing banner.
    /// Per-folder failures are reported in the summary, never returned.
    pub fn run(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for folder in &self.request.folders {
            let outcome = stage::run_folder(self, folder);
            log::debug!("{folder}: {outcome:?}");
            summary.outcomes.push((folder.clone(), outcome));
        }

        self.log.banner("ALL FOLDERS PROCESSED");
        summary.report(self.log);
        self.log.info(&format!(
            "Log files are available in the '{}' directory",
            self.config.log_dir.display()
        ));
        self.log
            .info("Please document these transfers in your migration dashboard");

        summary
    }

    fn copy_command(&self, job: &FolderJob, args: &[String]) -> String {
        format!(
            "{} copy {} {} {}",
            self.config.engine,
            job.source,
            job.dest,
            args.join(" ")
        )
    }
}

/// Outcome of every folder, in processing order
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<(String, FolderOutcome)>,
}

impl BatchSummary {
    pub fn count(&self, pred: impl Fn(&FolderOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    /// Folders that need the operator's attention
    pub fn problems(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| {
                matches!(
                    o,
                    FolderOutcome::DestinationFailed
                        | FolderOutcome::Failed
                        | FolderOutcome::Interrupted
                        | FolderOutcome::Transferred {
                            verified: Some(false)
                        }
                )
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn report(&self, log: &RunLog) {
        let transferred = self.count(|o| matches!(o, FolderOutcome::Transferred { .. }));
        let verified = self.count(|o| {
            matches!(
                o,
                FolderOutcome::Transferred {
                    verified: Some(true)
                }
            )
        });
        let previewed = self.count(|o| *o == FolderOutcome::Previewed);
        let declined = self.count(|o| *o == FolderOutcome::Declined);

        log.info(&format!(
            "{} folder(s): {} transferred ({} verified), {} dry run only, {} declined",
            self.outcomes.len(),
            transferred,
            verified,
            previewed,
            declined
        ));

        let problems = self.problems();
        if !problems.is_empty() {
            log.warn(&format!("Needs attention: {}", problems.join(", ")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::panel::PlainPanel;
    use crate::paths;
    use crate::testing::{CallLog, ScriptedBackend, ScriptedPrompt};
    use rclonekit::{CopyOptions, StatusKind};
    use std::cell::RefCell;
    use std::fs;
    use std::io;
    use std::rc::Rc;
    use tempfile::TempDir;

    const TIMESTAMP: &str = "20250325_101500";

    fn request(folders: &[&str]) -> TransferRequest {
        TransferRequest {
            folders: folders.iter().map(|f| (*f).to_string()).collect(),
            subpath: String::new(),
            copy: CopyOptions::default(),
            verify: true,
            auto_confirm: true,
            dry_run_only: false,
        }
    }

    fn plain_panel() -> Box<dyn StatusSink> {
        Box::new(PlainPanel::default())
    }

    struct Run {
        temp_dir: TempDir,
        summary: BatchSummary,
        calls: CallLog,
        run_log: String,
    }

    impl Run {
        fn folder_log(&self, folder: &str) -> String {
            let path = paths::folder_log_path(self.temp_dir.path(), folder, TIMESTAMP);
            fs::read_to_string(path).unwrap_or_default()
        }
    }

    fn run_with(
        backend: ScriptedBackend,
        request: &TransferRequest,
        prompt: &dyn Prompt,
        interrupt: &InterruptGuard,
        panel: &dyn Fn() -> Box<dyn StatusSink>,
    ) -> Run {
        let temp_dir = TempDir::new().unwrap();
        let config = MigrationConfig::resolve(
            ConfigFile::default(),
            Some(temp_dir.path().to_path_buf()),
        )
        .unwrap();
        let log = RunLog::create(&paths::run_log_path(temp_dir.path(), TIMESTAMP), true).unwrap();
        let calls = backend.calls();
        let client = Client::with_backend(Box::new(backend));

        let batch = Batch {
            config: &config,
            request,
            client: &client,
            log: &log,
            prompt,
            interrupt,
            panel,
            timestamp: TIMESTAMP,
        };
        let summary = batch.run();
        let run_log = fs::read_to_string(log.path()).unwrap();

        Run {
            temp_dir,
            summary,
            calls,
            run_log,
        }
    }

    fn run(backend: ScriptedBackend, request: &TransferRequest) -> Run {
        run_with(
            backend,
            request,
            &ScriptedPrompt::answering("yes"),
            &InterruptGuard::new(),
            &plain_panel,
        )
    }

    fn transfer_lines() -> Vec<String> {
        [
            "Transferred:   1 MiB / 3 MiB, 33%, 1 MiB/s, ETA 2s",
            "Transferred:   1 / 3, 33%",
            "Elapsed time:  1.0s",
            "Transferring:",
            " *  b.jpg: 50% /1Mi, 1Mi/s, 0s",
            "",
            "2025/03/25 10:15:01 INFO  : a.jpg: Copied (new)",
        ]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
    }

    #[test]
    fn test_dry_run_only_never_transfers() {
        let mut req = request(&["Photos"]);
        req.dry_run_only = true;
        let backend = ScriptedBackend {
            dry_run_stdout: "Transferred:   0 B / 3 MiB, 0%, 0 B/s, ETA -\n".to_string(),
            ..Default::default()
        };

        let run = run(backend, &req);

        assert_eq!(run.calls.count_prefix("copy --dry-run"), 1);
        assert_eq!(run.calls.count_prefix("copy dropbox"), 0);
        assert_eq!(run.calls.count_prefix("check"), 0);
        assert_eq!(
            run.summary.outcomes,
            vec![("Photos".to_string(), FolderOutcome::Previewed)]
        );

        let folder_log = run.folder_log("Photos");
        assert!(folder_log.contains("DRY RUN OUTPUT"));
        assert!(!folder_log.contains("VERIFICATION RESULTS"));
        assert!(run.run_log.contains("Dry run summary: Transferred:   0 B / 3 MiB"));
        assert!(run.run_log.contains("(--dry-run-only specified)"));
    }

    #[test]
    fn test_declined_confirmation_skips_transfer() {
        let mut req = request(&["Docs"]);
        req.auto_confirm = false;
        let prompt = ScriptedPrompt::answering("no");

        let run = run_with(
            ScriptedBackend::default(),
            &req,
            &prompt,
            &InterruptGuard::new(),
            &plain_panel,
        );

        assert_eq!(
            prompt.asked.borrow().as_slice(),
            ["Do you want to proceed with the actual transfer of 'Docs'? (yes/no)"]
        );
        assert!(run.run_log.contains("User chose to cancel the transfer."));
        assert!(run.run_log.contains("based on user decision"));
        assert_eq!(run.calls.count_prefix("copy dropbox"), 0);
        assert_eq!(run.summary.outcomes[0].1, FolderOutcome::Declined);
    }

    #[test]
    fn test_confirmed_transfer_runs() {
        let mut req = request(&["Docs"]);
        req.auto_confirm = false;
        let prompt = ScriptedPrompt::answering("YES");

        let run = run_with(
            ScriptedBackend::default(),
            &req,
            &prompt,
            &InterruptGuard::new(),
            &plain_panel,
        );

        assert!(run.run_log.contains("User chose to proceed the transfer."));
        assert_eq!(run.calls.count_prefix("copy dropbox"), 1);
    }

    #[test]
    fn test_destination_failure_does_not_stop_batch() {
        let backend = ScriptedBackend {
            mkdir_fails: vec!["Broken".to_string()],
            ..Default::default()
        };

        let run = run(backend, &request(&["Broken", "Photos"]));

        assert!(
            run.run_log
                .contains("[ERROR] ERROR creating destination folder:")
        );
        assert!(run.run_log.contains("STARTING PROCESS FOR: Photos"));
        assert_eq!(
            run.summary.outcomes,
            vec![
                ("Broken".to_string(), FolderOutcome::DestinationFailed),
                (
                    "Photos".to_string(),
                    FolderOutcome::Transferred {
                        verified: Some(true)
                    }
                ),
            ]
        );
        // nothing but mkdir touched the broken folder
        let calls = run.calls.snapshot();
        assert_eq!(
            calls.iter().filter(|c| c.contains("/Broken")).count(),
            1
        );
        assert!(run.run_log.contains("Needs attention: Broken"));
    }

    #[test]
    fn test_verification_passes() {
        let run = run(ScriptedBackend::default(), &request(&["Photos"]));

        assert!(
            run.run_log
                .contains("[SUCCESS] Verification passed - All files match")
        );
        let folder_log = run.folder_log("Photos");
        assert!(folder_log.contains("--- VERIFICATION RESULTS ---"));
        assert!(folder_log.contains("0 differences found"));
    }

    #[test]
    fn test_verification_mismatch_continues_batch() {
        let backend = ScriptedBackend {
            check_differs: true,
            ..Default::default()
        };

        let run = run(backend, &request(&["Photos", "Docs"]));

        assert_eq!(
            run.run_log
                .matches("[ERROR] Verification found differences, check the log file")
                .count(),
            2
        );
        assert_eq!(run.summary.outcomes.len(), 2);
        assert_eq!(
            run.summary.problems(),
            vec!["Photos", "Docs"]
        );
    }

    #[test]
    fn test_no_verify_skips_check() {
        let mut req = request(&["Photos"]);
        req.verify = false;

        let run = run(ScriptedBackend::default(), &req);

        assert_eq!(run.calls.count_prefix("check"), 0);
        assert!(run.run_log.contains("Skipping verification (--no-verify specified)"));
        assert_eq!(
            run.summary.outcomes[0].1,
            FolderOutcome::Transferred { verified: None }
        );
    }

    #[test]
    fn test_stage_order() {
        let run = run(ScriptedBackend::default(), &request(&["Photos"]));
        let calls = run.calls.snapshot();
        let kinds: Vec<&str> = calls
            .iter()
            .map(|c| c.split(' ').next().unwrap())
            .collect();
        assert_eq!(kinds, vec!["mkdir", "size", "copy", "copy", "check"]);
        assert!(calls[2].starts_with("copy --dry-run"));
        assert_eq!(
            calls[0],
            "mkdir DS423:/Backups/WASABI-MIGRATION/Photos"
        );
    }

    #[test]
    fn test_unparseable_size_defaults_to_zero() {
        let backend = ScriptedBackend {
            size_payload: Some("Total objects: 3\nTotal size: 3 MiB".to_string()),
            ..Default::default()
        };

        let run = run(backend, &request(&["Photos"]));

        assert!(
            run.run_log
                .contains("[WARNING] Could not get folder size information")
        );
        assert!(run.run_log.contains("Folder contains 0 files totaling 0 B"));
        // no rate without a size
        assert!(!run.run_log.contains("Average transfer rate"));
        assert!(matches!(
            run.summary.outcomes[0].1,
            FolderOutcome::Transferred { .. }
        ));
    }

    #[test]
    fn test_size_and_rate_reported() {
        let run = run(ScriptedBackend::default(), &request(&["Photos"]));
        assert!(run.run_log.contains("Folder contains 3 files totaling 3.0 MB"));
        assert!(run.run_log.contains("Time taken: 0h 0m 0s"));
        assert!(run.run_log.contains("Average transfer rate:"));
    }

    #[test]
    fn test_destination_creation_is_idempotent() {
        let backend = ScriptedBackend::default();
        let made = backend.made_dirs();

        let run = run(backend, &request(&["Photos", "Photos"]));

        assert_eq!(run.calls.count_prefix("mkdir"), 2);
        assert_eq!(made.lock().unwrap().len(), 1);
        assert!(
            run.summary
                .outcomes
                .iter()
                .all(|(_, o)| *o == FolderOutcome::Transferred { verified: Some(true) })
        );
    }

    #[test]
    fn test_transfer_output_logged_verbatim() {
        let backend = ScriptedBackend {
            transfer_lines: transfer_lines(),
            ..Default::default()
        };

        let run = run(backend, &request(&["Photos"]));

        let folder_log = run.folder_log("Photos");
        assert!(folder_log.contains("--- TRANSFER OUTPUT ---"));
        assert!(folder_log.contains(" *  b.jpg: 50% /1Mi, 1Mi/s, 0s\n"));
        assert!(folder_log.contains("a.jpg: Copied (new)"));
        assert!(folder_log.contains("--- END TRANSFER OUTPUT ---"));
        assert!(run.run_log.contains("[SUCCESS] Transfer completed successfully"));
    }

    /// Sink that records what it was given
    struct RecordingPanel {
        seen: Rc<RefCell<Vec<StatusKind>>>,
        fail: bool,
    }

    impl StatusSink for RecordingPanel {
        fn begin(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn update(&mut self, kind: StatusKind, _line: &str) -> io::Result<()> {
            self.seen.borrow_mut().push(kind);
            if self.fail {
                return Err(io::Error::other("tty closed"));
            }
            Ok(())
        }

        fn finish(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_only_status_lines_reach_panel() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let factory = {
            let seen = Rc::clone(&seen);
            move || -> Box<dyn StatusSink> {
                Box::new(RecordingPanel {
                    seen: Rc::clone(&seen),
                    fail: false,
                })
            }
        };
        let backend = ScriptedBackend {
            transfer_lines: transfer_lines(),
            ..Default::default()
        };

        run_with(
            backend,
            &request(&["Photos"]),
            &ScriptedPrompt::answering("yes"),
            &InterruptGuard::new(),
            &factory,
        );

        assert_eq!(
            *seen.borrow(),
            vec![
                StatusKind::AggregateSummary,
                StatusKind::FileSummary,
                StatusKind::ElapsedTime,
                StatusKind::CurrentFile,
                StatusKind::CurrentFile,
            ]
        );
    }

    #[test]
    fn test_panel_error_falls_back_to_log_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let factory = {
            let seen = Rc::clone(&seen);
            move || -> Box<dyn StatusSink> {
                Box::new(RecordingPanel {
                    seen: Rc::clone(&seen),
                    fail: true,
                })
            }
        };
        let backend = ScriptedBackend {
            transfer_lines: transfer_lines(),
            ..Default::default()
        };

        let run = run_with(
            backend,
            &request(&["Photos"]),
            &ScriptedPrompt::answering("yes"),
            &InterruptGuard::new(),
            &factory,
        );

        // one failed update, then no more calls
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(
            run.run_log
                .matches("Advanced display error. Check log file for progress.")
                .count(),
            1
        );
        // every line still reached the folder log
        assert!(run.folder_log("Photos").contains("a.jpg: Copied (new)"));
        assert!(run.run_log.contains("Verification passed"));
    }

    #[test]
    fn test_interrupt_is_recoverable() {
        let interrupt = InterruptGuard::new();
        let backend = ScriptedBackend {
            transfer_lines: transfer_lines(),
            interrupt: Some(interrupt.clone()),
            ..Default::default()
        };

        let run = run_with(
            backend,
            &request(&["Photos", "Docs"]),
            &ScriptedPrompt::answering("yes"),
            &interrupt,
            &plain_panel,
        );

        assert!(
            run.run_log
                .contains("[WARNING] Transfer interrupted by user (Ctrl+C)")
        );
        assert!(
            run.run_log
                .contains("The transfer can be resumed by running the same command again.")
        );
        assert_eq!(run.summary.outcomes[0].1, FolderOutcome::Interrupted);
        // the interrupted folder is not verified, the batch moved on
        assert_eq!(run.calls.count_prefix("check"), 0);
        assert!(run.run_log.contains("STARTING PROCESS FOR: Docs"));
        assert!(!interrupt.on_signal(), "guard must be disarmed after the batch");
    }

    #[test]
    fn test_interrupt_stops_reading_mid_transfer() {
        let interrupt = InterruptGuard::new();
        let backend = ScriptedBackend {
            transfer_lines: transfer_lines(),
            interrupt: Some(interrupt.clone()),
            interrupt_after: Some(2),
            ..Default::default()
        };

        let run = run_with(
            backend,
            &request(&["Photos"]),
            &ScriptedPrompt::answering("yes"),
            &interrupt,
            &plain_panel,
        );

        assert_eq!(run.calls.count_prefix("cancel"), 1);
        assert_eq!(run.calls.count_prefix("check"), 0);
        assert_eq!(run.summary.outcomes[0].1, FolderOutcome::Interrupted);

        let folder_log = run.folder_log("Photos");
        assert!(folder_log.contains("Transferred:   1 / 3, 33%"));
        // nothing after the Ctrl+C was read
        assert!(!folder_log.contains("Elapsed time:  1.0s"));
        assert!(!folder_log.contains("a.jpg: Copied (new)"));
        assert!(folder_log.contains("--- END TRANSFER OUTPUT ---"));
        assert!(run.run_log.contains("Time taken:"));
    }

    #[test]
    fn test_verification_error_still_reports_timing() {
        let backend = ScriptedBackend {
            check_fails: true,
            ..Default::default()
        };

        let run = run(backend, &request(&["Photos", "Docs"]));

        assert_eq!(
            run.run_log
                .matches("[ERROR] Error during transfer: IO error: check could not be started")
                .count(),
            2
        );
        assert!(!run.run_log.contains("Unexpected error processing folder"));
        assert_eq!(run.run_log.matches("Time taken:").count(), 2);
        assert_eq!(
            run.summary.outcomes,
            vec![
                ("Photos".to_string(), FolderOutcome::Failed),
                ("Docs".to_string(), FolderOutcome::Failed),
            ]
        );
    }

    #[test]
    fn test_non_zero_exit_still_verifies() {
        let backend = ScriptedBackend {
            transfer_exit: 5,
            ..Default::default()
        };

        let run = run(backend, &request(&["Photos"]));

        assert!(
            run.run_log
                .contains("[WARNING] Transfer process exited with code: 5")
        );
        assert_eq!(run.calls.count_prefix("check"), 1);
    }

    #[test]
    fn test_subpath_applied_to_both_sides() {
        let mut req = request(&["Docs"]);
        req.subpath = "Media 2020".to_string();

        let run = run(ScriptedBackend::default(), &req);

        let calls = run.calls.snapshot();
        assert_eq!(
            calls[0],
            "mkdir DS423:/Backups/WASABI-MIGRATION/Media 2020/Docs"
        );
        assert_eq!(
            calls[1],
            "size dropbox-wasabi-migration:/WASABI-MIGRATION/Media 2020/Docs"
        );
    }

    #[test]
    fn test_folder_log_name() {
        let run = run(ScriptedBackend::default(), &request(&["Media Files"]));
        let expected = run
            .temp_dir
            .path()
            .join(format!("Media_Files-{TIMESTAMP}.log"));
        assert!(expected.exists());
        assert!(run.run_log.contains("ALL FOLDERS PROCESSED"));
    }
}
