//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Build metrics logger.
///
/// Pairs host lifecycle events into timed intervals and writes them to
/// InfluxDB as line-protocol points.
#[derive(Debug, Parser)]
#[command(name = "bm", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Read host events as JSON lines from stdin and report completed intervals.
    Watch {
        /// Print encoded points to stdout instead of sending them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the backend configuration and show what would be sent.
    Check,
}
