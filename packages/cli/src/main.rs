#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `outbreak`: tornado outbreak climatology from the command line.
//!
//! Every subcommand reads `outbreak.toml` (or `--config`) and writes under
//! the output directory. `sample` persists the day table so `screen` can be
//! rerun without fetching grids again.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use outbreak_analysis::AnalysisConfig;
use outbreak_analysis::config::DEFAULT_CONFIG_FILE;
use outbreak_table::paths::{DEFAULT_OUTPUT_DIR, day_table_path};

#[derive(Parser)]
#[command(name = "outbreak", about = "Tornado outbreak climatology")]
struct Cli {
    /// Analysis configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Tornado catalog CSV
    #[arg(long, global = true, default_value = "data/tornadoes.csv")]
    catalog: PathBuf,
    /// Directory outputs are written to
    #[arg(long, global = true, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Group events into convective days and list the most energetic outbreaks
    Days {
        /// Number of outbreak days listed (overrides `study.top_n`)
        #[arg(long)]
        top: Option<usize>,
    },
    /// Sample grid fields over every outbreak and baseline day and save the day table
    Sample,
    /// Run correlation screens on a saved day table
    Screen {
        /// Day table to read (defaults to `days.csv` in the output directory)
        #[arg(long)]
        table: Option<PathBuf>,
    },
    /// Summarize outbreak activity per year and fit trends
    Trend,
    /// Run every stage
    Run,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = outbreak_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = AnalysisConfig::load(&cli.config)?;

    match cli.command {
        Commands::Days { top } => {
            commands::days(&config, &cli.catalog, top.unwrap_or(config.study.top_n))?;
        }
        Commands::Sample => {
            commands::sample(&config, &cli.catalog, &cli.output, &multi).await?;
        }
        Commands::Screen { table } => {
            let table = table.unwrap_or_else(|| day_table_path(&cli.output));
            commands::screen(&config, &table, &cli.output)?;
        }
        Commands::Trend => commands::trend(&config, &cli.catalog, &cli.output)?,
        Commands::Run => {
            let progress = outbreak_cli_utils::SamplingBar::new(&multi, "Sampling");
            let report = outbreak_analysis::pipeline::run(
                &config,
                &cli.catalog,
                &cli.output,
                progress.as_ref(),
            )
            .await?;
            commands::print_report(&report);
        }
    }

    Ok(())
}
