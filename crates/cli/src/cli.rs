//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Eventcast - live event fan-out over WebSocket
#[derive(Parser, Debug)]
#[command(
    name = "eventcast",
    author,
    version,
    about = "Live event fan-out server",
    long_about = "Pops line-delimited events from a Redis list and broadcasts each one, \n\
                  in order, to every connected WebSocket viewer, while appending them to \n\
                  a daily file that is truncated at a fixed time of day."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "EVENTCAST_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "EVENTCAST_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Append logs to this file instead of stdout
    #[arg(long, global = true, env = "EVENTCAST_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the server
    Run(RunArgs),

    /// Validate configuration without running
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Configuration file (TOML or JSON) or legacy configuration directory
    #[arg(
        short,
        long,
        default_value = "eventcast.toml",
        env = "EVENTCAST_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the HTTP listen address
    #[arg(long, env = "EVENTCAST_BIND")]
    pub bind: Option<String>,

    /// Override the Redis list to pop from
    #[arg(long, env = "EVENTCAST_QUEUE")]
    pub queue: Option<String>,

    /// Override the Redis host
    #[arg(long, env = "EVENTCAST_REDIS_HOST")]
    pub redis_host: Option<String>,

    /// Override the Redis port
    #[arg(long, env = "EVENTCAST_REDIS_PORT")]
    pub redis_port: Option<u16>,

    /// Override the daily store path
    #[arg(long, env = "EVENTCAST_STORE_PATH")]
    pub store_path: Option<String>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "EVENTCAST_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Configuration file or legacy configuration directory to validate
    #[arg(short, long, default_value = "eventcast.toml", env = "EVENTCAST_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Configuration file or legacy configuration directory
    #[arg(short, long, default_value = "eventcast.toml", env = "EVENTCAST_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
