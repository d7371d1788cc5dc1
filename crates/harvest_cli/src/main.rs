mod cli;
mod config;
mod progress;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_error, engine_info, LogDestination};
use harvest_engine::{run_harvest, StoreClient};
use log::LevelFilter;

use crate::cli::Cli;
use crate::progress::TerminalProgress;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = if cli.no_progress {
        LogDestination::Both
    } else {
        LogDestination::File
    };
    engine_logging::initialize(destination, level, &cli.log_file);

    let config = config::resolve(&cli).context("invalid configuration")?;
    engine_info!(
        "Harvesting into {:?}: ids > {}, years {:?}, type {:?}, concurrency {}",
        config.output_path,
        config.criteria.min_app_id,
        config.criteria.years,
        config.criteria.item_type,
        config.concurrency
    );

    let client = Arc::new(
        StoreClient::new(config.listing.clone(), config.detail.clone())
            .context("failed to build HTTP client")?,
    );
    let progress = TerminalProgress::new(!cli.no_progress);

    let result = run_harvest(&config, client.as_ref(), client.clone(), &progress).await;
    progress.finish();

    let summary = result.map_err(|err| {
        engine_error!("Harvest aborted: {}", err);
        err
    })?;

    println!("{summary}");
    if !summary.is_complete() || summary.dropped + summary.write_failures > 0 {
        println!("Some items were not stored; re-run to retry them.");
    }
    println!("Output: {}", config.output_path.display());
    Ok(())
}
