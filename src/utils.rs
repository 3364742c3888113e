//! Utility functions for logging, timestamps and the file system.
//!
//! - String truncation for log previews
//! - Snapshot timestamp formatting and `publishedAt` parsing
//! - Parent-directory creation before a sink writes its file

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Format used in CSV snapshot file names.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with an ellipsis and the count of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Render a run timestamp as `YYYY-MM-DD_HH-MM-SS`.
pub fn snapshot_timestamp(now: &DateTime<Local>) -> String {
    now.format(SNAPSHOT_TIMESTAMP_FORMAT).to_string()
}

/// Parse a `publishedAt` value into a UTC timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T12:00:00Z`, `2024-05-01T12:00:00+02:00`)
/// and the naive forms `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM:SS[.f]`
/// and `YYYY-MM-DD`, which are taken as UTC. Anything else is `None`.
pub fn parse_published_at(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    debug!(%value, "Unparseable publishedAt");
    None
}

/// Canonical text form of a parsed timestamp: RFC 3339, UTC, whole seconds.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Create the parent directory of `path` if it has one and it is missing.
pub async fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .await
            .map_err(|e| PipelineError::io(parent, e)),
        _ => Ok(()),
    }
}
