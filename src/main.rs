mod analysis;
mod annual;
mod config;
mod data;
mod error;
mod manager;
mod stats;
mod trend;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    work_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Mean, variance and covariance matrix of the daily records.
    Describe,

    /// Annual extremes over anchored windows.
    Aggregate,

    /// Linear trend and prediction of the annual extremes.
    Trend,

    /// Remove generated files.
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.work_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Describe => mgr.describe_daily()?,
        Command::Aggregate => mgr.aggregate_annual()?,
        Command::Trend => mgr.analyze_trend()?,
        Command::Clean => mgr.clean_outputs()?,
    }

    Ok(())
}
