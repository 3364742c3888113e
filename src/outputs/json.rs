//! JSON output: the cumulative archive and the cleaned record array.
//!
//! The archive is a single JSON array of records deduplicated by `url`
//! across every ingest run. Each run loads it, appends the unseen records
//! and rewrites the whole file. Existing records are carried over as raw
//! objects and never reshaped.

use crate::error::{PipelineError, Result};
use crate::models::Article;
use crate::utils::ensure_parent_dir;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Serialize with four-space indentation.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Read the archive text. A missing or blank file reads as `None`.
async fn read_archive_text(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(text) if text.trim().is_empty() => Ok(None),
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PipelineError::io(path, e)),
    }
}

/// Load the archive as raw JSON objects, preserving field order.
pub async fn read_archive_objects(path: &Path) -> Result<Vec<Map<String, Value>>> {
    match read_archive_text(path).await? {
        Some(text) => serde_json::from_str(&text).map_err(|e| PipelineError::json(path, e)),
        None => Ok(Vec::new()),
    }
}

/// Write `value` as indented JSON to `path`, replacing it.
///
/// The document goes to a sibling temporary file first and is renamed into
/// place, so a failed write leaves the previous file intact.
pub async fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let bytes = to_pretty_json(value).map_err(|e| PipelineError::json(path, e))?;
    ensure_parent_dir(path).await?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, bytes)
        .await
        .map_err(|e| PipelineError::io(&tmp, e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}

/// Append the unseen records of a batch to the archive.
///
/// A record survives only if it has a `url` that is neither in the archive
/// nor earlier in the same batch. Survivors are appended in batch order and
/// the whole archive is rewritten; the records already there keep their
/// exact fields and key order. An existing archive with nothing to add is
/// left untouched; a missing one is created as `[]`.
///
/// # Arguments
///
/// * `records` - The enriched batch, in API order
/// * `path` - Location of the archive file
///
/// # Returns
///
/// The number of records appended.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn append_to_archive(records: &[Article], path: &Path) -> Result<usize> {
    let mut archive = read_archive_objects(path).await?;
    let mut seen: HashSet<String> = archive
        .iter()
        .filter_map(|o| o.get("url").and_then(Value::as_str).map(String::from))
        .collect();
    debug!(existing = archive.len(), "Loaded JSON archive");

    let mut added = 0usize;
    for article in records {
        if !article.url.as_ref().is_some_and(|url| seen.insert(url.clone())) {
            continue;
        }
        archive.push(article.to_object());
        added += 1;
    }

    if added == 0 && fs::try_exists(path).await.unwrap_or(false) {
        info!(path = %path.display(), total = archive.len(), "JSON unchanged; no new records");
        return Ok(0);
    }

    write_pretty(path, &archive).await?;
    info!(path = %path.display(), added, total = archive.len(), "JSON updated");
    Ok(added)
}
