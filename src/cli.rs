use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Safely copy folders between two rclone remotes: preview, confirm, transfer, verify",
    long_about = None
)]
pub struct Cli {
    /// Folder(s) to transfer (must be inside the migration root)
    #[arg(required_unless_present = "completions")]
    pub folders: Vec<String>,

    /// Subpath within the migration root (e.g. "Media Files Online Backup 8-31-2020")
    #[arg(long, default_value = "")]
    pub subpath: String,

    /// Number of concurrent transfers [default: 4]
    #[arg(long)]
    pub transfers: Option<u32>,

    /// Number of checkers [default: 8]
    #[arg(long)]
    pub checkers: Option<u32>,

    /// Transactions per second limit [default: 2]
    #[arg(long)]
    pub tpslimit: Option<u32>,

    /// Bandwidth limit, rclone syntax [default: 10M]
    #[arg(long)]
    pub bwlimit: Option<String>,

    /// Interval between progress updates [default: 15s]
    #[arg(long)]
    pub stats: Option<String>,

    /// Skip verification step
    #[arg(long)]
    pub no_verify: bool,

    /// Skip confirmation prompts
    #[arg(short, long)]
    pub yes: bool,

    /// Only perform dry run, no actual transfer
    #[arg(long)]
    pub dry_run_only: bool,

    /// Directory for run and folder logs [default: logs]
    #[arg(long, env = "FERRY_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Config file [default: <config dir>/ferry/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only show warnings, errors and results on the console
    #[arg(short, long)]
    pub quiet: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum, exclusive = true)]
    pub completions: Option<Shell>,
}
