use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fleet_cli::commands::{QueryContext, drivers, fleet, intervals, stats};
use fleet_cli::snapshot::load_snapshot;
use fleet_cli::{Cli, Commands, Config};

/// Load config and the snapshot it points at.
fn load_context(cli: &Cli) -> Result<QueryContext> {
    let config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let snapshot_path: &Path = cli.snapshot.as_deref().unwrap_or(&config.snapshot_path);
    let snapshot = load_snapshot(snapshot_path)?;

    Ok(QueryContext {
        snapshot,
        config: config.engine,
        now: cli.now.unwrap_or_else(Utc::now),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout().lock();

    match &cli.command {
        Some(Commands::Stats {
            driver,
            period,
            json,
        }) => {
            let ctx = load_context(&cli)?;
            stats::run(&mut stdout, &ctx, driver, &period.to_period(), *json)?;
        }
        Some(Commands::Fleet { period, json }) => {
            let ctx = load_context(&cli)?;
            fleet::run(&mut stdout, &ctx, &period.to_period(), *json)?;
        }
        Some(Commands::Intervals {
            driver,
            period,
            json,
        }) => {
            let ctx = load_context(&cli)?;
            intervals::run(&mut stdout, &ctx, driver, &period.to_period(), *json)?;
        }
        Some(Commands::Drivers) => {
            let ctx = load_context(&cli)?;
            drivers::run(&mut stdout, &ctx.snapshot)?;
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
