use std::path::PathBuf;

use clap::Parser;

/// Harvest store catalog entries released in a year range into a JSONL file.
///
/// Re-running against the same output resumes: identifiers already stored
/// are skipped.
#[derive(Debug, Parser)]
#[command(name = "steam-harvest", version, about)]
pub struct Cli {
    /// Web API key for the catalog listing endpoint
    #[arg(long, env = "STEAM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output JSONL file; also the resume checkpoint
    #[arg(short, long, env = "HARVEST_OUTPUT")]
    pub output: Option<PathBuf>,

    /// RON file with run settings; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// First accepted release year
    #[arg(long)]
    pub year_start: Option<u16>,

    /// Last accepted release year
    #[arg(long)]
    pub year_end: Option<u16>,

    /// Only identifiers strictly greater than this are considered
    #[arg(long)]
    pub min_app_id: Option<u64>,

    /// Maximum number of detail requests in flight
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Log file path
    #[arg(long, default_value = "harvest.log")]
    pub log_file: PathBuf,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable the progress bar and log to the terminal as well
    #[arg(long)]
    pub no_progress: bool,
}
