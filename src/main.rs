mod cli;
mod client;
mod config;
mod error;
mod logging;
mod model;
mod pipeline;
mod scraper;
mod utils;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::logging::{init_logging, LoggerConfig};
use crate::pipeline::{write_snapshot, PendingImporter, RunMode};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match init(&cli) {
        Ok(config) => config,
        Err(e) => {
            // No subscriber to report through yet.
            eprintln!("openstax-scraper: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, &config).await {
        log_error!(e => "[main] Sweep aborted");
        std::process::exit(1);
    }
}

fn init(cli: &Cli) -> Result<Config> {
    let config = Config::load(cli.config.as_deref())?;
    init_logging(LoggerConfig::from_config(&config.logging)?)?;
    log_info!("[main] Configuration loaded");
    Ok(config)
}

async fn run(cli: &Cli, config: &Config) -> Result<()> {
    let mode = if cli.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Live
    };
    log_info!("[main] Starting OpenStax sweep ({:?})", mode);

    let mut importer = PendingImporter;
    let outcome = pipeline::run(config, mode, &mut importer).await?;

    println!("{}", outcome.summary);

    if let Some(dir) = &cli.output {
        write_snapshot(dir, &outcome.chapters, &outcome.formulas)?;
    }

    if let Some(report) = outcome.import {
        log_info!(
            "[main] Imported {} chapters and {} formulas",
            report.chapters_imported,
            report.formulas_imported
        );
    }

    log_info!("[main] Sweep completed");
    Ok(())
}
