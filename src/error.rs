//! Error types shared by the ingestion and cleaning jobs.
//!
//! Every failure mode the pipeline knows about has its own variant so that
//! the operator sees *why* a run stopped. None of them are retried: the
//! first error aborts the job and is reported from `main`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the ingestion and cleaning pipelines.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The credential file could not be opened or read.
    #[error("failed to read credential file {path}: {source}")]
    CredentialUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The credential file has no line mentioning the expected key.
    #[error("no `{key}` entry found in credential file {path}")]
    CredentialMissing { key: String, path: PathBuf },

    /// The line naming the key has no `=` separator.
    #[error("credential line for `{key}` in {path} has no `=` separator")]
    CredentialMalformed { key: String, path: PathBuf },

    /// The configured endpoint is not a valid URL.
    #[error("invalid headlines endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// Transport-level failure talking to the headlines API.
    #[error("headlines request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The headlines API answered with a non-success status.
    #[error("headlines API returned {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The headlines API body was not the JSON document we expect.
    #[error("malformed headlines payload: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The existing table predates one or more record columns. Not migrated.
    #[error("table `{table}` is missing columns {missing:?}; schema migration is not supported")]
    SchemaDrift { table: String, missing: Vec<String> },

    /// A snapshot with the same category, country and second already exists.
    #[error("CSV snapshot {0} already exists; refusing to overwrite")]
    SnapshotExists(PathBuf),

    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl PipelineError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON (de)serialization error with the file it concerns.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        PipelineError::Json {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
