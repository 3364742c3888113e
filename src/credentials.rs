//! API key lookup from a plain `KEY=VALUE` text file.

use crate::error::{PipelineError, Result};
use std::path::Path;
use tracing::{info, instrument};

/// Read the value of `key` from a credential file.
///
/// The file is scanned line by line; the first line mentioning `key` wins
/// and everything after its first `=` (trimmed) is returned. The value's
/// format is not checked.
///
/// # Arguments
///
/// * `path` - `KEY=VALUE` text file
/// * `key` - Key to look for, e.g. `NEWS_API_KEY`
///
/// # Errors
///
/// - [`PipelineError::CredentialUnreadable`] if the file cannot be read
/// - [`PipelineError::CredentialMissing`] if no line mentions `key`
/// - [`PipelineError::CredentialMalformed`] if that line has no `=`
#[instrument(level = "info", skip_all, fields(path = %path.display(), %key))]
pub async fn load_credential(path: &Path, key: &str) -> Result<String> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PipelineError::CredentialUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let line = text
        .lines()
        .find(|line| line.contains(key))
        .ok_or_else(|| PipelineError::CredentialMissing {
            key: key.to_string(),
            path: path.to_path_buf(),
        })?;

    let (_, value) = line
        .trim()
        .split_once('=')
        .ok_or_else(|| PipelineError::CredentialMalformed {
            key: key.to_string(),
            path: path.to_path_buf(),
        })?;

    info!("Loaded API credential");
    Ok(value.trim().to_string())
}
