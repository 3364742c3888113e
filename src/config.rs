//! Run configuration shared by the ingest and clean jobs.
//!
//! Values come from three layers, later ones winning:
//! 1. Built-in defaults ([`Config::default`])
//! 2. An optional YAML file (`--config`)
//! 3. Command-line flags / environment variables
//!
//! ```yaml
//! category: sports
//! country: us
//! output_dir: batch_output
//! archive_path: batch_output/output.json
//! credential_path: api_keys.txt
//! db_path: tech_news.db
//! ```

use crate::cli::{CleanArgs, IngestArgs};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Default top-headlines endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://newsapi.org/v2/top-headlines";

/// Everything a run needs to know. Unset keys in a YAML file fall back to
/// the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Headline category requested from the API (e.g. `sports`).
    pub category: String,
    /// Two-letter country code requested from the API.
    pub country: String,
    /// Directory that receives the per-run CSV snapshots.
    pub output_dir: PathBuf,
    /// The deduplicated JSON archive.
    pub archive_path: PathBuf,
    /// `KEY=VALUE` text file holding the API key.
    pub credential_path: PathBuf,
    /// Name of the key to look up in `credential_path`.
    pub credential_key: String,
    /// SQLite database holding the `batch_news` table.
    pub db_path: PathBuf,
    /// Top-headlines URL; query parameters are appended per request.
    pub endpoint: String,
    /// Request timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    /// Output of the clean job as an indented JSON array.
    pub cleaned_json_path: PathBuf,
    /// Output of the clean job as CSV.
    pub cleaned_csv_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            category: "sports".to_string(),
            country: "us".to_string(),
            output_dir: PathBuf::from("batch_output"),
            archive_path: PathBuf::from("batch_output/output.json"),
            credential_path: PathBuf::from("api_keys.txt"),
            credential_key: "NEWS_API_KEY".to_string(),
            db_path: PathBuf::from("tech_news.db"),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: None,
            cleaned_json_path: PathBuf::from("cleaned_output.json"),
            cleaned_csv_path: PathBuf::from("cleaned_output.csv"),
        }
    }
}

impl Config {
    /// Load configuration from an optional YAML file.
    ///
    /// With no path, the defaults are returned unchanged.
    ///
    /// # Arguments
    ///
    /// * `path` - YAML file from `--config`, if any
    ///
    /// # Returns
    ///
    /// The merged configuration, or `PipelineError::Config` if the file does
    /// not parse.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PipelineError::io(path, e))?;
        let config = Self::from_yaml(&text).map_err(|source| PipelineError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Apply the `ingest` subcommand's flags on top of this configuration.
    pub fn apply_ingest_overrides(&mut self, args: &IngestArgs) {
        if let Some(v) = &args.category {
            self.category = v.clone();
        }
        if let Some(v) = &args.country {
            self.country = v.clone();
        }
        if let Some(v) = &args.output_dir {
            self.output_dir = v.clone();
        }
        if let Some(v) = &args.archive_path {
            self.archive_path = v.clone();
        }
        if let Some(v) = &args.credential_path {
            self.credential_path = v.clone();
        }
        if let Some(v) = &args.db_path {
            self.db_path = v.clone();
        }
        if let Some(v) = &args.endpoint {
            self.endpoint = v.clone();
        }
        if args.timeout_secs.is_some() {
            self.timeout_secs = args.timeout_secs;
        }
    }

    /// Apply the `clean` subcommand's flags on top of this configuration.
    pub fn apply_clean_overrides(&mut self, args: &CleanArgs) {
        if let Some(v) = &args.archive_path {
            self.archive_path = v.clone();
        }
        if let Some(v) = &args.json_out {
            self.cleaned_json_path = v.clone();
        }
        if let Some(v) = &args.csv_out {
            self.cleaned_csv_path = v.clone();
        }
    }
}
