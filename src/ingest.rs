//! The ingest job: one page of headlines into three sinks.
//!
//! ```text
//! credential file ──► headlines API ──► normalize ──┬─► CSV snapshot   (every record)
//!                                                   ├─► batch_news     (unseen urls)
//!                                                   └─► JSON archive   (unseen urls)
//! ```
//!
//! Steps run strictly in that order and the first failure ends the run.
//! A credential failure therefore happens before any request is sent.

use crate::api::{build_client, fetch_headlines};
use crate::config::Config;
use crate::credentials::load_credential;
use crate::error::Result;
use crate::models::{Article, RawArticle};
use crate::outputs::{csv, json, sqlite};
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument};

/// Outcome of a successful ingest run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    /// Articles returned by the API.
    pub fetched: usize,
    /// The snapshot written for this run.
    pub csv_path: PathBuf,
    /// Rows appended to `batch_news`.
    pub stored: usize,
    /// Records appended to the JSON archive.
    pub archived: usize,
}

/// Enrich an API article into a stored record.
///
/// A nested `{id, name}` source is replaced by its name (empty if absent),
/// and the run's category and country are attached.
pub fn normalize(raw: RawArticle, category: &str, country: &str) -> Article {
    Article {
        source: raw.source.map(|s| s.into_name()),
        author: raw.author,
        title: raw.title,
        description: raw.description,
        url: raw.url,
        urlToImage: raw.urlToImage,
        publishedAt: raw.publishedAt,
        content: raw.content,
        category: Some(category.to_string()),
        country: Some(country.to_string()),
        extra: raw.extra,
    }
}

/// Run the ingest job with the current local time as the run timestamp.
pub async fn run(config: &Config) -> Result<IngestReport> {
    let client = build_client(config.timeout_secs)?;
    run_at(config, &client, Local::now()).await
}

/// Run the ingest job with an explicit client and run timestamp.
///
/// # Arguments
///
/// * `config` - Resolved run configuration
/// * `client` - HTTP client used for the single headlines request
/// * `now` - Run timestamp; names the CSV snapshot
///
/// # Returns
///
/// An [`IngestReport`] with per-sink counts. Nothing is written if the
/// credential or the fetch fails.
#[instrument(level = "info", skip_all, fields(category = %config.category, country = %config.country))]
pub async fn run_at(
    config: &Config,
    client: &reqwest::Client,
    now: DateTime<Local>,
) -> Result<IngestReport> {
    let t0 = Instant::now();

    let api_key = load_credential(&config.credential_path, &config.credential_key).await?;

    let raw = fetch_headlines(
        client,
        &config.endpoint,
        &config.country,
        &config.category,
        &api_key,
    )
    .await?;

    let records: Vec<Article> = raw
        .into_iter()
        .map(|a| normalize(a, &config.category, &config.country))
        .collect();

    let csv_path = csv::write_csv(
        &records,
        &config.output_dir,
        &config.category,
        &config.country,
        &now,
    )
    .await?;
    let stored = sqlite::append_to_store(&records, &config.db_path).await?;
    let archived = json::append_to_archive(&records, &config.archive_path).await?;

    let report = IngestReport {
        fetched: records.len(),
        csv_path,
        stored,
        archived,
    };
    info!(
        fetched = report.fetched,
        stored = report.stored,
        archived = report.archived,
        csv = %report.csv_path.display(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Ingest complete"
    );
    Ok(report)
}
