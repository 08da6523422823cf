//! Endpoint reachability check, run once before any folder is touched.

use anyhow::{Result, bail};
use rclonekit::{Client, RemotePath};

use crate::runlog::RunLog;

/// Make sure `engine` runs, then list the root of both remotes. Any
/// failure is fatal for the batch.
pub fn check_access(
    client: &Client,
    engine: &str,
    source: &RemotePath,
    dest: &RemotePath,
    log: &RunLog,
) -> Result<()> {
    if !client.is_available() {
        log.error(&format!(
            "ACCESS ERROR: cannot run '{engine}'. Is rclone installed and on PATH?"
        ));
        log.error("Cannot access remotes, aborting for safety.");
        bail!("transfer engine '{engine}' is not available");
    }

    let probes = [
        ("source", source.root()),
        ("destination", dest.root()),
    ];

    for (label, remote) in probes {
        log.info(&format!("Checking {label} access..."));
        if let Err(e) = client.list_dirs(&remote) {
            log.error(&format!("ACCESS ERROR: {e}"));
            log.error("Cannot access remotes, aborting for safety.");
            bail!("{label} remote {remote} is not accessible: {e}");
        }
        log.info(&format!("{} remote accessible", capitalize(label)));
    }

    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;
    use std::fs;
    use tempfile::TempDir;

    fn bases() -> (RemotePath, RemotePath) {
        (
            RemotePath::parse("src:/WASABI-MIGRATION").unwrap(),
            RemotePath::parse("nas:/WASABI-MIGRATION").unwrap(),
        )
    }

    #[test]
    fn test_both_reachable() {
        let temp_dir = TempDir::new().unwrap();
        let log = RunLog::create(&temp_dir.path().join("run.log"), true).unwrap();
        let backend = ScriptedBackend::default();
        let calls = backend.calls();
        let client = Client::with_backend(Box::new(backend));
        let (src, dst) = bases();

        check_access(&client, "rclone", &src, &dst, &log).unwrap();
        assert_eq!(calls.snapshot(), vec!["lsd src:", "lsd nas:"]);

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("Source remote accessible"));
        assert!(content.contains("Destination remote accessible"));
    }

    #[test]
    fn test_unreachable_destination_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let log = RunLog::create(&temp_dir.path().join("run.log"), true).unwrap();
        let backend = ScriptedBackend {
            unreachable: vec!["nas:".to_string()],
            ..Default::default()
        };
        let client = Client::with_backend(Box::new(backend));
        let (src, dst) = bases();

        let err = check_access(&client, "rclone", &src, &dst, &log).unwrap_err();
        assert!(err.to_string().contains("destination remote nas:"));

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("[ERROR] ACCESS ERROR:"));
        assert!(content.contains("Cannot access remotes, aborting for safety."));
    }

    #[test]
    fn test_missing_engine_aborts_before_listing() {
        let temp_dir = TempDir::new().unwrap();
        let log = RunLog::create(&temp_dir.path().join("run.log"), true).unwrap();
        let backend = ScriptedBackend {
            engine_missing: true,
            ..Default::default()
        };
        let calls = backend.calls();
        let client = Client::with_backend(Box::new(backend));
        let (src, dst) = bases();

        let err = check_access(&client, "/opt/rclone", &src, &dst, &log).unwrap_err();
        assert!(err.to_string().contains("'/opt/rclone' is not available"));
        assert!(calls.snapshot().is_empty());

        let content = fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("[ERROR] ACCESS ERROR: cannot run '/opt/rclone'"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("source"), "Source");
        assert_eq!(capitalize(""), "");
    }
}
