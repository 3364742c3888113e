//! # News Batch
//!
//! Batch ingestion of top-headline metadata from a headlines API, plus an
//! offline cleaning pass over what was collected.
//!
//! ## Jobs
//!
//! - **ingest**: fetch one page of articles for a category/country pair,
//!   tag each record and write it to three sinks: a per-run CSV snapshot,
//!   the append-only `batch_news` SQLite table and the deduplicated JSON
//!   archive.
//! - **clean**: load the JSON archive, fill defaults, drop bulky columns,
//!   normalize text, deduplicate by `url`, parse timestamps, and write
//!   `cleaned_output.json` + `cleaned_output.csv`.
//!
//! ## Usage
//!
//! ```sh
//! news_batch ingest --category sports --country us
//! news_batch clean
//! ```
//!
//! Both jobs are sequential, single-shot and fail on the first error.
//! Scheduling is left to cron or similar.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod clean;
mod cli;
mod config;
mod credentials;
mod error;
mod ingest;
mod models;
mod outputs;
mod utils;

use cli::{Cli, Command};
use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_batch starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref()).await?;

    match &args.command {
        Command::Ingest(ingest_args) => {
            config.apply_ingest_overrides(ingest_args);
            debug!(?config, "Resolved configuration");
            match ingest::run(&config).await {
                Ok(report) => info!(
                    fetched = report.fetched,
                    stored = report.stored,
                    archived = report.archived,
                    csv = %report.csv_path.display(),
                    "Ingest finished"
                ),
                Err(e) => {
                    error!(error = %e, "Ingest aborted");
                    return Err(e.into());
                }
            }
        }
        Command::Clean(clean_args) => {
            config.apply_clean_overrides(clean_args);
            debug!(?config, "Resolved configuration");
            match clean::run(&config).await {
                Ok(report) => info!(
                    input_rows = report.input_rows,
                    output_rows = report.output_rows,
                    json = %report.json_path.display(),
                    csv = %report.csv_path.display(),
                    "Clean finished"
                ),
                Err(e) => {
                    error!(error = %e, "Clean aborted");
                    return Err(e.into());
                }
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
