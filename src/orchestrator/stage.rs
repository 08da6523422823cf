//! The per-folder pipeline.
//!
//! Stages run in a fixed order and each one can end the folder early:
//!
//! 1. ensure destination  (failure skips the folder)
//! 2. size probe          (failure is a warning, counts become zero)
//! 3. dry run
//! 4. confirmation gate   (dry-run-only or "no" ends the folder here)
//! 5. live transfer       (Ctrl+C ends the folder, the batch goes on)
//! 6. verification        (optional)
//! 7. timing and rate report
//!
//! Nothing here returns an error to the batch: every failure is logged and
//! turned into a [`FolderOutcome`].

use anyhow::Result;
use rclonekit::status;
use rclonekit::{RemotePath, SizeSummary, StreamEvent, classify};
use std::time::{Duration, Instant};

use super::Batch;
use super::folder_log::{FolderLog, Section};
use crate::confirm;
use crate::panel::StatusSink;
use crate::paths;
use crate::progress;
use crate::ui;

/// Longest wait for rclone output before checking for Ctrl+C again
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How a folder's processing ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderOutcome {
    /// Destination could not be created; nothing else ran
    DestinationFailed,
    /// Dry run only, as requested
    Previewed,
    /// The operator answered something other than "yes"
    Declined,
    /// Transfer ran to completion. `verified` is `None` when skipped.
    Transferred { verified: Option<bool> },
    /// Ctrl+C during the live transfer
    Interrupted,
    /// Unexpected error, or the transfer could not be started
    Failed,
}

/// One folder in flight
pub struct FolderJob {
    pub name: String,
    pub source: RemotePath,
    pub dest: RemotePath,
    pub log: FolderLog,
    pub started: Instant,
}

enum TransferEnd {
    Completed,
    Interrupted,
}

/// Run every stage for `folder`
pub fn run_folder(batch: &Batch<'_>, folder: &str) -> FolderOutcome {
    let started = Instant::now();
    batch.log.banner(&format!("STARTING PROCESS FOR: {folder}"));

    let (source_base, dest_base) = batch.config.bases(&batch.request.subpath);
    let source = source_base.join(folder);
    let dest = dest_base.join(folder);

    if let Err(e) = batch.client.mkdir(&dest) {
        batch
            .log
            .error(&format!("ERROR creating destination folder: {e}"));
        batch.log.warn("Skipping this folder for safety.");
        return FolderOutcome::DestinationFailed;
    }
    batch
        .log
        .info(&format!("Destination folder created/verified: {folder}"));

    let log_path = paths::folder_log_path(&batch.config.log_dir, folder, batch.timestamp);
    let result = FolderLog::open(&log_path).and_then(|log| {
        let mut job = FolderJob {
            name: folder.to_string(),
            source,
            dest,
            log,
            started,
        };
        run_stages(batch, &mut job)
    });

    result.unwrap_or_else(|e| {
        batch
            .log
            .error(&format!("Unexpected error processing folder {folder}: {e:#}"));
        batch.log.warn("Continuing to next folder for safety.");
        FolderOutcome::Failed
    })
}

fn run_stages(batch: &Batch<'_>, job: &mut FolderJob) -> Result<FolderOutcome> {
    let size = probe_size(batch, job);

    dry_run(batch, job)?;

    if let Some(outcome) = confirmation_gate(batch, &job.name)? {
        return Ok(outcome);
    }

    let outcome = transfer_and_verify(batch, job).unwrap_or_else(|e| {
        batch.log.error(&format!("Error during transfer: {e:#}"));
        FolderOutcome::Failed
    });

    report_timing(batch, job, size);
    Ok(outcome)
}

/// Errors from here still get a timing report
fn transfer_and_verify(batch: &Batch<'_>, job: &mut FolderJob) -> Result<FolderOutcome> {
    match live_transfer(batch, job)? {
        TransferEnd::Completed => Ok(FolderOutcome::Transferred {
            verified: verify(batch, job)?,
        }),
        TransferEnd::Interrupted => Ok(FolderOutcome::Interrupted),
    }
}

fn probe_size(batch: &Batch<'_>, job: &FolderJob) -> SizeSummary {
    let size = batch.client.size(&job.source).unwrap_or_else(|e| {
        batch
            .log
            .warn(&format!("Could not get folder size information: {e}"));
        batch.log.warn("Proceeding with transfer anyway.");
        SizeSummary::default()
    });

    batch.log.info(&format!(
        "Folder contains {} files totaling {}",
        size.count,
        ui::format_size(size.bytes)
    ));
    size
}

fn dry_run(batch: &Batch<'_>, job: &mut FolderJob) -> Result<()> {
    let options = batch.request.copy.preview();

    batch
        .log
        .info(&format!("Starting DRY RUN for {}...", job.name));
    batch
        .log
        .info(&format!("Command: {}", batch.copy_command(job, &options.to_args())));

    let pb = progress::spinner("Running dry run...");
    let output = batch.client.copy(&job.source, &job.dest, &options);
    progress::finish_clear(&pb);
    let output = output?;

    job.log.captured(Section::DryRun, &output)?;
    batch.log.record(&format!(
        "Dry run output written to {}",
        job.log.path().display()
    ));

    let summary = status::last_aggregate_summary(&output.stdout)
        .or_else(|| status::last_aggregate_summary(&output.stderr));
    if let Some(summary) = summary {
        batch.log.info(&format!("Dry run summary: {summary}"));
    }
    if !output.success() {
        batch.log.warn(&format!(
            "Dry run exited with code: {}",
            exit_label(output.code)
        ));
    }

    batch
        .log
        .info("DRY RUN completed - NO FILES WERE TRANSFERRED");
    batch.log.info(&format!(
        "Review the folder log carefully: {}",
        job.log.path().display()
    ));
    Ok(())
}

/// `Some(outcome)` ends the folder before the live transfer
fn confirmation_gate(batch: &Batch<'_>, folder: &str) -> Result<Option<FolderOutcome>> {
    if batch.request.dry_run_only {
        batch.log.info(&format!(
            "Skipping actual transfer for {folder} (--dry-run-only specified)"
        ));
        return Ok(Some(FolderOutcome::Previewed));
    }

    if batch.request.auto_confirm {
        batch
            .log
            .info("Proceeding without confirmation (--yes specified)");
        return Ok(None);
    }

    let answer = batch.prompt.ask(&confirm::transfer_question(folder))?;
    let proceed = confirm::is_affirmative(&answer);
    batch.log.info(&format!(
        "User chose to {} the transfer.",
        if proceed { "proceed" } else { "cancel" }
    ));

    if proceed {
        Ok(None)
    } else {
        batch.log.info(&format!(
            "Skipping actual transfer for {folder} based on user decision"
        ));
        Ok(Some(FolderOutcome::Declined))
    }
}

fn live_transfer(batch: &Batch<'_>, job: &mut FolderJob) -> Result<TransferEnd> {
    let options = &batch.request.copy;

    batch
        .log
        .info(&format!("STARTING ACTUAL TRANSFER for {}...", job.name));
    batch
        .log
        .info(&format!("Command: {}", batch.copy_command(job, &options.to_args())));
    batch
        .log
        .info("Progress updates will appear below (press Ctrl+C to stop):");

    let scope = batch.interrupt.arm();
    let mut stream = batch
        .client
        .copy_streaming(&job.source, &job.dest, options)?;

    let mut panel = (batch.panel)();
    let mut drawing = start_panel(batch, panel.as_mut());

    job.log.begin(Section::Transfer)?;
    loop {
        if scope.interrupted() {
            stream.cancel();
            break;
        }
        let line = match stream.poll(POLL_INTERVAL) {
            StreamEvent::Line(line) => line,
            StreamEvent::Idle => continue,
            StreamEvent::Closed => break,
        };
        if line.trim().is_empty() {
            continue;
        }
        job.log.line(&line)?;

        let kind = classify(&line);
        if drawing && kind.is_status() {
            if let Err(e) = panel.update(kind, &line) {
                log::debug!("Status panel failed: {e}");
                batch
                    .log
                    .warn("Advanced display error. Check log file for progress.");
                drawing = false;
            }
        }
    }
    if drawing {
        let _ = panel.finish();
    }

    let code = stream.wait()?;
    job.log.end(Section::Transfer)?;

    if scope.interrupted() {
        batch.log.warn("Transfer interrupted by user (Ctrl+C)");
        batch
            .log
            .info("The transfer can be resumed by running the same command again.");
        batch
            .log
            .info("Rclone will skip files that have already been transferred.");
        return Ok(TransferEnd::Interrupted);
    }

    if code == Some(0) {
        batch.log.success("Transfer completed successfully");
    } else {
        batch.log.warn(&format!(
            "Transfer process exited with code: {}",
            exit_label(code)
        ));
    }
    Ok(TransferEnd::Completed)
}

fn start_panel(batch: &Batch<'_>, panel: &mut dyn StatusSink) -> bool {
    match panel.begin() {
        Ok(()) => true,
        Err(e) => {
            log::debug!("Status panel unavailable: {e}");
            batch
                .log
                .warn("Advanced display error. Check log file for progress.");
            false
        }
    }
}

/// `Ok(None)` when verification was skipped
fn verify(batch: &Batch<'_>, job: &mut FolderJob) -> Result<Option<bool>> {
    if !batch.request.verify {
        batch
            .log
            .info("Skipping verification (--no-verify specified)");
        return Ok(None);
    }

    batch.log.info("Starting verification...");
    batch.log.info(&format!(
        "Verification command: {} check {} {} --one-way",
        batch.config.engine, job.source, job.dest
    ));

    let pb = progress::spinner("Verifying...");
    let report = batch.client.check_one_way(&job.source, &job.dest);
    progress::finish_clear(&pb);
    let report = report?;

    job.log.captured(Section::Verification, &report.output)?;

    if report.passed {
        batch.log.success("Verification passed - All files match");
    } else {
        batch
            .log
            .error("Verification found differences, check the log file");
    }
    Ok(Some(report.passed))
}

fn report_timing(batch: &Batch<'_>, job: &FolderJob, size: SizeSummary) {
    let elapsed = job.started.elapsed();
    batch
        .log
        .info(&format!("Time taken: {}", ui::format_duration(elapsed)));
    if let Some(rate) = ui::average_rate(size.bytes, elapsed) {
        batch
            .log
            .info(&format!("Average transfer rate: {rate:.2} MB/s"));
    }
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "terminated by signal".to_string(), |c| c.to_string())
}
