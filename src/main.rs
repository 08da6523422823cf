mod cli;
mod config;
mod confirm;
mod guard;
mod interrupt;
mod orchestrator;
mod panel;
mod paths;
mod preflight;
mod progress;
mod request;
mod runlog;
#[cfg(test)]
mod testing;
mod ui;

use anyhow::Result;
use chrono::Local;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::Cli;
use config::{ConfigFile, MigrationConfig};
use confirm::TerminalPrompt;
use interrupt::InterruptGuard;
use orchestrator::Batch;
use rclonekit::Client;
use request::TransferRequest;
use runlog::RunLog;
use std::io;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "ferry", &mut io::stdout());
        return Ok(());
    }

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let interrupt = InterruptGuard::new();
    interrupt.install()?;

    let file = ConfigFile::discover(cli.config.as_deref())?;
    let config = MigrationConfig::resolve(file, cli.log_dir.clone())?;
    let request = TransferRequest::from_cli(&cli, &config.transfer);

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let log = RunLog::create(&paths::run_log_path(&config.log_dir, &timestamp), cli.quiet)?;

    guard::log_safety_banner(&log, &config.source_base, &config.dest_base);
    if let Err(e) = guard::check_request(&request.subpath, &request.folders) {
        log.error(&format!("FATAL: {e}"));
        return Err(e.into());
    }

    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());
    log.info(&format!("Starting batch transfer on {host}"));
    log.record(&format!(
        "Command: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    ));

    let (source, dest) = config.bases(&request.subpath);
    if !cli.quiet {
        println!();
        ui::kv("Source", &source.to_string());
        ui::kv("Destination", &dest.to_string());
        ui::kv("Folders", &request.folders.join(", "));
        ui::kv("Transfers", &request.copy.transfers.to_string());
        ui::kv("Checkers", &request.copy.checkers.to_string());
        ui::kv("TPS limit", &request.copy.tps_limit.to_string());
        ui::kv("Bandwidth limit", &request.copy.bw_limit);
        ui::kv("Verify", if request.verify { "yes" } else { "no" });
        ui::kv("Run log", &log.path().display().to_string());
    }
    log.record(&format!(
        "Source: {source} | Destination: {dest} | Folders: {}",
        request.folders.join(", ")
    ));

    let client = Client::with_binary(&config.engine);
    preflight::check_access(&client, &config.engine, &source, &dest, &log)?;

    let batch = Batch {
        config: &config,
        request: &request,
        client: &client,
        log: &log,
        prompt: &TerminalPrompt,
        interrupt: &interrupt,
        panel: &panel::for_stdout,
        timestamp: &timestamp,
    };
    batch.run();

    Ok(())
}
