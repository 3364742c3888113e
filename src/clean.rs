//! The clean job: normalize and deduplicate the archive.
//!
//! Every run recomputes its output from the current archive and overwrites
//! `cleaned_output.json` and `cleaned_output.csv`. The archive itself is
//! never modified.
//!
//! # Pipeline
//!
//! 1. [`load`] the archive into an [`ArticleTable`]
//! 2. [`fill_defaults`] for `author` and `description`
//! 3. [`drop_columns`] `content` and `urlToImage`
//! 4. [`clean_text`] on `title` and `description`
//! 5. [`deduplicate`] by `url`, first occurrence wins
//! 6. [`parse_timestamp`] on `publishedAt`
//! 7. [`save`] as JSON and CSV

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::models::Article;
use crate::outputs::{csv, json};
use crate::utils::{format_timestamp, parse_published_at};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Columns removed from the cleaned output.
pub const DROPPED_COLUMNS: [&str; 2] = ["content", "urlToImage"];

pub const DEFAULT_AUTHOR: &str = "Unknown";
pub const DEFAULT_DESCRIPTION: &str = "No Description";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Records in archive order together with the columns they carry.
///
/// `columns` is the union of field names across all records, in the order
/// they are first seen. It decides which fields are written out and in
/// what order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleTable {
    pub columns: Vec<String>,
    pub rows: Vec<Article>,
}

impl ArticleTable {
    /// Build a table from raw archive objects.
    pub fn from_objects(objects: Vec<Map<String, Value>>) -> serde_json::Result<Self> {
        if objects.is_empty() {
            return Ok(Self {
                columns: Article::COLUMNS.iter().map(|c| c.to_string()).collect(),
                rows: Vec::new(),
            });
        }

        let mut columns: Vec<String> = Vec::new();
        for object in &objects {
            for key in object.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = objects
            .into_iter()
            .map(|o| serde_json::from_value(Value::Object(o)))
            .collect::<serde_json::Result<Vec<Article>>>()?;
        Ok(Self { columns, rows })
    }

    /// Whether any record in the archive carried `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Add `name` as the last column if it is not present yet.
    pub fn ensure_column(&mut self, name: &str) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
    }

    /// Rows projected onto the table's columns.
    pub fn to_objects(&self) -> Vec<Map<String, Value>> {
        self.rows.iter().map(|r| r.to_row(&self.columns)).collect()
    }
}

/// Outcome of a successful clean run.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanReport {
    /// Records read from the archive.
    pub input_rows: usize,
    /// Records written after deduplication.
    pub output_rows: usize,
    /// Where the cleaned JSON array was written.
    pub json_path: PathBuf,
    /// Where the cleaned CSV was written.
    pub csv_path: PathBuf,
}

/// Read the JSON archive into a table. A missing or empty archive gives an
/// empty table.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load(path: &Path) -> Result<ArticleTable> {
    let objects = json::read_archive_objects(path).await?;
    let table = ArticleTable::from_objects(objects).map_err(|e| PipelineError::json(path, e))?;
    info!(rows = table.rows.len(), columns = table.columns.len(), "Loaded archive");
    Ok(table)
}

/// Replace a missing `author` with `"Unknown"` and a missing `description`
/// with `"No Description"`. Other nulls are left alone.
pub fn fill_defaults(table: &mut ArticleTable) {
    table.ensure_column("author");
    table.ensure_column("description");
    for row in &mut table.rows {
        row.author.get_or_insert_with(|| DEFAULT_AUTHOR.to_string());
        row.description
            .get_or_insert_with(|| DEFAULT_DESCRIPTION.to_string());
    }
}

/// Remove columns from the table. Names that are not present are ignored.
pub fn drop_columns(table: &mut ArticleTable, names: &[&str]) {
    table.columns.retain(|c| !names.contains(&c.as_str()));
    for row in &mut table.rows {
        for name in names {
            row.clear_field(name);
        }
    }
}

/// Normalize free text.
///
/// `None` becomes the empty string; this is also what a non-string value in
/// the archive arrives as, since [`Article`] reads those as missing. Otherwise `<...>` tags are removed,
/// whitespace runs collapse to one space, the ends are trimmed and the
/// result is lowercased. Applying it twice gives the same result as once.
pub fn clean_text(value: Option<&str>) -> String {
    let Some(text) = value else {
        return String::new();
    };
    let text = TAG_RE.replace_all(text, "");
    let text = WS_RE.replace_all(&text, " ");
    text.trim().to_lowercase()
}

/// Apply [`clean_text`] to `title` and `description`.
pub fn clean_text_columns(table: &mut ArticleTable) {
    table.ensure_column("title");
    table.ensure_column("description");
    for row in &mut table.rows {
        row.title = Some(clean_text(row.title.as_deref()));
        row.description = Some(clean_text(row.description.as_deref()));
    }
}

/// Drop rows whose `url` was already seen, keeping the first occurrence.
/// Rows without a `url` count as sharing one.
pub fn deduplicate(table: &mut ArticleTable) {
    let before = table.rows.len();
    table.rows = std::mem::take(&mut table.rows)
        .into_iter()
        .unique_by(|row| row.url.clone())
        .collect();
    debug!(before, after = table.rows.len(), "Deduplicated by url");
}

/// Rewrite `publishedAt` as canonical RFC 3339 UTC.
///
/// Does nothing if the table has no `publishedAt` column. Values that fail
/// to parse become null; their rows are kept.
pub fn parse_timestamp(table: &mut ArticleTable) {
    if !table.has_column("publishedAt") {
        return;
    }
    let mut invalid = 0usize;
    for row in &mut table.rows {
        let parsed = row
            .publishedAt
            .as_deref()
            .and_then(parse_published_at)
            .map(|dt| format_timestamp(&dt));
        if parsed.is_none() && row.publishedAt.is_some() {
            invalid += 1;
        }
        row.publishedAt = parsed;
    }
    if invalid > 0 {
        info!(invalid, "Unparseable publishedAt values set to null");
    }
}

/// Write the table as an indented JSON array of row objects and as CSV.
///
/// # Arguments
///
/// * `table` - The cleaned table; its `columns` decide keys and header
/// * `json_path` - Destination of the JSON array, overwritten
/// * `csv_path` - Destination of the CSV file, overwritten
#[instrument(level = "info", skip_all, fields(json_path = %json_path.display(), csv_path = %csv_path.display()))]
pub async fn save(table: &ArticleTable, json_path: &Path, csv_path: &Path) -> Result<()> {
    json::write_pretty(json_path, &table.to_objects()).await?;
    info!(path = %json_path.display(), rows = table.rows.len(), "Cleaned JSON saved");
    csv::write_table(csv_path, &table.columns, &table.rows).await?;
    info!(path = %csv_path.display(), rows = table.rows.len(), "Cleaned CSV saved");
    Ok(())
}

/// Run the whole clean pipeline on the configured archive.
///
/// # Arguments
///
/// * `config` - Supplies `archive_path`, `cleaned_json_path` and `cleaned_csv_path`
///
/// # Returns
///
/// A [`CleanReport`] with row counts and the written paths.
#[instrument(level = "info", skip_all, fields(archive = %config.archive_path.display()))]
pub async fn run(config: &Config) -> Result<CleanReport> {
    let mut table = load(&config.archive_path).await?;
    let input_rows = table.rows.len();

    fill_defaults(&mut table);
    drop_columns(&mut table, &DROPPED_COLUMNS);
    clean_text_columns(&mut table);
    deduplicate(&mut table);
    parse_timestamp(&mut table);

    save(&table, &config.cleaned_json_path, &config.cleaned_csv_path).await?;

    let report = CleanReport {
        input_rows,
        output_rows: table.rows.len(),
        json_path: config.cleaned_json_path.clone(),
        csv_path: config.cleaned_csv_path.clone(),
    };
    info!(
        input_rows = report.input_rows,
        output_rows = report.output_rows,
        "Clean complete"
    );
    Ok(report)
}
