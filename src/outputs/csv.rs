//! CSV output.
//!
//! Two kinds of CSV file are produced:
//!
//! - **Snapshots**: one file per ingest run holding every fetched record,
//!   duplicates included, named `{category}_{country}_{timestamp}.csv`.
//!   Snapshots are never overwritten.
//! - **Tables**: the cleaner's output, overwritten on every run.
//!
//! Both start with a header row of column names; `null` becomes an empty
//! cell.

use crate::error::{PipelineError, Result};
use crate::models::{Article, csv_cell};
use crate::utils::{ensure_parent_dir, snapshot_timestamp};
use chrono::{DateTime, Local};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Columns for a batch of records: the named columns, then any extra
/// fields in the order they are first seen.
pub fn columns_for(records: &[Article]) -> Vec<String> {
    let mut columns: Vec<String> = Article::COLUMNS.iter().map(|c| c.to_string()).collect();
    for record in records {
        for key in record.extra.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Serialize rows to CSV bytes with a header row.
pub fn render(columns: &[String], rows: &[Article]) -> Result<Vec<u8>> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| csv_cell(&row.field(c))))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ::csv::Error::from(e.into_error()))?;
    Ok(bytes)
}

/// Path of the snapshot for one run.
pub fn snapshot_path(
    output_dir: &Path,
    category: &str,
    country: &str,
    now: &DateTime<Local>,
) -> PathBuf {
    output_dir.join(format!(
        "{}_{}_{}.csv",
        category,
        country,
        snapshot_timestamp(now)
    ))
}

/// Write every fetched record to a fresh snapshot file.
///
/// The records are written as given, without deduplication. An empty
/// batch produces a header-only file.
///
/// # Returns
///
/// Path of the snapshot, `<output_dir>/<category>_<country>_<timestamp>.csv`.
///
/// # Errors
///
/// [`PipelineError::SnapshotExists`] if a snapshot for the same category,
/// country and second is already on disk.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), count = records.len()))]
pub async fn write_csv(
    records: &[Article],
    output_dir: &Path,
    category: &str,
    country: &str,
    now: &DateTime<Local>,
) -> Result<PathBuf> {
    let path = snapshot_path(output_dir, category, country, now);
    let bytes = render(&columns_for(records), records)?;

    fs::create_dir_all(output_dir)
        .await
        .map_err(|e| PipelineError::io(output_dir, e))?;

    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(PipelineError::SnapshotExists(path));
        }
        Err(e) => return Err(PipelineError::io(&path, e)),
    };
    file.write_all(&bytes)
        .await
        .map_err(|e| PipelineError::io(&path, e))?;
    file.flush().await.map_err(|e| PipelineError::io(&path, e))?;

    info!(path = %path.display(), rows = records.len(), "CSV saved");
    Ok(path)
}

/// Write a table to `path`, replacing any previous file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = rows.len()))]
pub async fn write_table(path: &Path, columns: &[String], rows: &[Article]) -> Result<()> {
    let bytes = render(columns, rows)?;
    ensure_parent_dir(path).await?;
    fs::write(path, bytes)
        .await
        .map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn article(url: &str, title: &str) -> Article {
        Article {
            source: Some("ESPN".to_string()),
            title: Some(title.to_string()),
            url: Some(url.to_string()),
            category: Some("sports".to_string()),
            country: Some("us".to_string()),
            ..Default::default()
        }
    }

    fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = ::csv::Reader::from_path(path).unwrap();
        let headers = reader.headers().unwrap().iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn test_columns_for_appends_extras_in_first_seen_order() {
        let mut a = article("http://a", "A");
        a.extra.insert("zeta".to_string(), json!(1));
        let mut b = article("http://b", "B");
        b.extra.insert("alpha".to_string(), json!(2));
        b.extra.insert("zeta".to_string(), json!(3));

        let columns = columns_for(&[a, b]);
        assert_eq!(columns.len(), Article::COLUMNS.len() + 2);
        assert_eq!(&columns[Article::COLUMNS.len()..], ["zeta", "alpha"]);
    }

    #[test]
    fn test_snapshot_path_pattern() {
        let now = Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let path = snapshot_path(Path::new("batch_output"), "sports", "us", &now);
        assert_eq!(
            path,
            PathBuf::from("batch_output/sports_us_2024-05-01_09-00-00.csv")
        );
    }

    #[tokio::test]
    async fn test_write_csv_keeps_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let records = vec![
            article("http://a", "First, with comma"),
            article("http://a", "Again"),
        ];

        let path = write_csv(&records, dir.path(), "sports", "us", &now)
            .await
            .unwrap();
        let (headers, rows) = read_rows(&path);

        assert_eq!(headers, Article::COLUMNS.to_vec());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][2], "First, with comma");
        assert_eq!(rows[0][4], "http://a");
        assert_eq!(rows[1][4], "http://a");
        // author is null
        assert_eq!(rows[0][1], "");
    }

    #[tokio::test]
    async fn test_write_csv_empty_batch_is_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        let path = write_csv(&[], dir.path(), "sports", "us", &now).await.unwrap();
        let (headers, rows) = read_rows(&path);
        assert_eq!(headers.len(), Article::COLUMNS.len());
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_write_csv_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let first = write_csv(&[article("http://a", "A")], dir.path(), "sports", "us", &now)
            .await
            .unwrap();

        let err = write_csv(&[], dir.path(), "sports", "us", &now)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SnapshotExists(_)));

        let (_, rows) = read_rows(&first);
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_write_table_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned_output.csv");
        let columns = vec!["url".to_string(), "title".to_string()];

        write_table(&path, &columns, &[article("http://a", "A"), article("http://b", "B")])
            .await
            .unwrap();
        write_table(&path, &columns, &[article("http://c", "C")])
            .await
            .unwrap();

        let (headers, rows) = read_rows(&path);
        assert_eq!(headers, ["url", "title"]);
        assert_eq!(rows, vec![vec!["http://c".to_string(), "C".to_string()]]);
    }
}
