//! Command-line interface definitions for News Batch.
//!
//! Every flag is optional: anything left unset comes from the YAML config
//! file (if given) or from the built-in defaults in [`crate::config`].

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the News Batch application.
///
/// # Examples
///
/// ```sh
/// # Fetch one page of sports headlines for the US into the default sinks
/// news_batch ingest
///
/// # Another category/country pair, with a config file for the rest
/// news_batch --config batch.yaml ingest --category business --country gb
///
/// # Normalize the archive into cleaned_output.{json,csv}
/// news_batch clean
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "NEWS_BATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch one page of top headlines and append them to the CSV, SQLite and JSON sinks
    Ingest(IngestArgs),
    /// Normalize and deduplicate the JSON archive into a cleaned JSON + CSV pair
    Clean(CleanArgs),
}

#[derive(Args, Debug, Default)]
pub struct IngestArgs {
    /// Headline category (e.g. sports, business, technology)
    #[arg(long)]
    pub category: Option<String>,

    /// Two-letter country code
    #[arg(long)]
    pub country: Option<String>,

    /// Directory for the per-run CSV snapshots
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// JSON archive file
    #[arg(short, long)]
    pub archive_path: Option<PathBuf>,

    /// Text file holding `NEWS_API_KEY=...`
    #[arg(long, env = "NEWS_API_KEY_FILE")]
    pub credential_path: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long)]
    pub db_path: Option<PathBuf>,

    /// Top-headlines endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// HTTP timeout in seconds (default: wait indefinitely)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub struct CleanArgs {
    /// JSON archive file to clean
    #[arg(short, long)]
    pub archive_path: Option<PathBuf>,

    /// Output path for the cleaned JSON
    #[arg(short, long)]
    pub json_out: Option<PathBuf>,

    /// Output path for the cleaned CSV
    #[arg(short = 's', long)]
    pub csv_out: Option<PathBuf>,
}
