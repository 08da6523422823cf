use rclonekit::CopyOptions;

use crate::cli::Cli;
use crate::config::TransferDefaults;

/// Everything one batch run was asked to do. Built once from the CLI and
/// config defaults, never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub folders: Vec<String>,
    pub subpath: String,
    pub copy: CopyOptions,
    pub verify: bool,
    pub auto_confirm: bool,
    pub dry_run_only: bool,
}

impl TransferRequest {
    /// CLI flags win over config defaults
    pub fn from_cli(cli: &Cli, defaults: &TransferDefaults) -> Self {
        let copy = CopyOptions {
            transfers: cli.transfers.unwrap_or(defaults.transfers),
            checkers: cli.checkers.unwrap_or(defaults.checkers),
            tps_limit: cli.tpslimit.unwrap_or(defaults.tpslimit),
            bw_limit: cli.bwlimit.clone().unwrap_or_else(|| defaults.bwlimit.clone()),
            stats_interval: cli.stats.clone().unwrap_or_else(|| defaults.stats.clone()),
            dry_run: false,
        };

        Self {
            folders: cli.folders.clone(),
            subpath: cli.subpath.clone(),
            copy,
            verify: !cli.no_verify,
            auto_confirm: cli.yes,
            dry_run_only: cli.dry_run_only,
        }
    }
}
