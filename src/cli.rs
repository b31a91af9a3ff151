// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Two subcommands mirror the two halves of the tool:
//! - `manage`: supervise the single long-running pipeline instance for an
//!   instrument/date (start/stop/restart/status).
//! - `dispatch`: run the per-configuration reduction jobs produced by the
//!   setup step, with bounded parallelism.

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `drpctl`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "drpctl",
    version,
    about = "Supervise and dispatch instrument data-reduction pipelines.",
    long_about = None
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DRPCTL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start, stop, restart or query the pipeline process for an instrument.
    Manage(ManageArgs),

    /// Run the discovered reduction jobs for an instrument in parallel.
    Dispatch(DispatchArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ManageArgs {
    /// Instrument name (as configured, e.g. KCWI).
    pub instrument: String,

    /// Lifecycle action to perform.
    #[arg(value_enum)]
    pub action: LifecycleAction,

    /// Processing level: 1 or 2.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub level: u8,

    /// UT date for the pipeline (YYYYMMDD). Defaults to today's UT date.
    #[arg(long, value_name = "YYYYMMDD", value_parser = parse_utdate)]
    pub date: Option<String>,

    /// Skip the instrument availability check and start regardless.
    #[arg(long)]
    pub skip_availability: bool,

    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "drpctl.toml")]
    pub config: String,
}

#[derive(Debug, Clone, Args)]
pub struct DispatchArgs {
    /// Instrument name (as configured).
    #[arg(required_unless_present = "list_instruments")]
    pub instrument: Option<String>,

    /// Path to raw files. Defaults to the current directory.
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<std::path::PathBuf>,

    /// Directory to put output in. Defaults to `<input>/redux`.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<std::path::PathBuf>,

    /// Raw-file name prefix (e.g. "KB."). Defaults to the configured value.
    #[arg(short, long, value_name = "PREFIX")]
    pub root: Option<String>,

    /// Number of parallel workers. Defaults to available parallelism - 1.
    #[arg(short = 'n', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Path to the config file (TOML).
    #[arg(short, long, value_name = "PATH", default_value = "drpctl.toml")]
    pub config: String,

    /// Only run the setup step; don't reduce anything.
    #[arg(long)]
    pub setup_only: bool,

    /// Process calibrations only.
    #[arg(long)]
    pub calib_only: bool,

    /// Print the configured instruments and exit.
    #[arg(long)]
    pub list_instruments: bool,
}

/// Lifecycle action for `manage`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LifecycleAction {
    Start,
    Stop,
    Restart,
    Status,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Validate a `YYYYMMDD` UT date string.
fn parse_utdate(s: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .map(|_| s.to_string())
        .map_err(|_| format!("not a valid date: '{s}' (expected YYYYMMDD)"))
}

/// Today's UT date in `YYYYMMDD` form, used when `--date` is omitted.
pub fn default_utdate() -> String {
    Utc::now().format("%Y%m%d").to_string()
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utdate_accepts_valid_dates() {
        assert_eq!(parse_utdate("20240101").unwrap(), "20240101");
    }

    #[test]
    fn utdate_rejects_garbage() {
        assert!(parse_utdate("2024-01-01").is_err());
        assert!(parse_utdate("20241301").is_err());
        assert!(parse_utdate("yesterday").is_err());
    }

    #[test]
    fn default_utdate_is_parseable() {
        assert!(parse_utdate(&default_utdate()).is_ok());
    }
}
