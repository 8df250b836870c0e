use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bm_cli::commands::{check, watch};
use bm_cli::{Cli, Commands, Config, host};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so dry-run output on stdout stays clean
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match &cli.command {
        Some(Commands::Watch { dry_run }) => {
            watch::run(&config, *dry_run)?;
        }
        Some(Commands::Check) => {
            let tags = host::gather(&config.host).into_context();
            check::run(&mut io::stdout().lock(), &config, &tags)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
