//! The append-only `batch_news` table.
//!
//! Each call opens one connection, appends the batch inside a transaction
//! and closes the connection again. The table has one `TEXT` column per
//! named [`Article`] field. There is no uniqueness constraint on `url`:
//! duplicates are filtered out before inserting.
//!
//! A table created by an older version with fewer columns is reported as
//! [`PipelineError::SchemaDrift`] and never altered.

use crate::error::{PipelineError, Result};
use crate::models::Article;
use crate::utils::ensure_parent_dir;
use once_cell::sync::Lazy;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, Row};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument};

pub const TABLE: &str = "batch_news";

static CREATE_TABLE: Lazy<String> = Lazy::new(|| {
    let columns = Article::COLUMNS
        .iter()
        .map(|c| format!("\"{c}\" TEXT"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {TABLE} ({columns})")
});

static INSERT_ROW: Lazy<String> = Lazy::new(|| {
    let columns = Article::COLUMNS
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let params = vec!["?"; Article::COLUMNS.len()].join(", ");
    format!("INSERT INTO {TABLE} ({columns}) VALUES ({params})")
});

/// Open (creating if absent) the database file.
pub async fn connect(db_path: &Path) -> Result<SqliteConnection> {
    ensure_parent_dir(db_path).await?;
    let conn = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .connect()
        .await?;
    debug!(path = %db_path.display(), "Opened SQLite database");
    Ok(conn)
}

/// Create `batch_news` if needed and verify it has every named column.
pub async fn ensure_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(&CREATE_TABLE).execute(&mut *conn).await?;

    let rows = sqlx::query(&format!("PRAGMA table_info({TABLE})"))
        .fetch_all(&mut *conn)
        .await?;
    let present = rows
        .iter()
        .map(|row| row.try_get::<String, _>("name"))
        .collect::<std::result::Result<HashSet<_>, _>>()?;

    let missing: Vec<String> = Article::COLUMNS
        .iter()
        .filter(|c| !present.contains(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::SchemaDrift {
            table: TABLE.to_string(),
            missing,
        });
    }
    Ok(())
}

/// Every non-null `url` already stored.
pub async fn existing_urls(conn: &mut SqliteConnection) -> Result<HashSet<String>> {
    let urls = sqlx::query_scalar::<_, String>(&format!(
        "SELECT url FROM {TABLE} WHERE url IS NOT NULL"
    ))
    .fetch_all(&mut *conn)
    .await?;
    Ok(urls.into_iter().collect())
}

/// Append the records whose `url` is not yet stored.
///
/// Records without a `url` are always appended; a `url` repeated within the
/// batch is stored once.
///
/// # Returns
///
/// The number of rows inserted.
#[instrument(level = "info", skip_all, fields(db_path = %db_path.display(), count = records.len()))]
pub async fn append_to_store(records: &[Article], db_path: &Path) -> Result<usize> {
    let mut conn = connect(db_path).await?;
    let result = append_with(&mut conn, records).await;
    conn.close().await?;

    let inserted = result?;
    info!(db_path = %db_path.display(), inserted, "Saved to SQLite");
    Ok(inserted)
}

async fn append_with(conn: &mut SqliteConnection, records: &[Article]) -> Result<usize> {
    ensure_table(conn).await?;
    let mut seen = existing_urls(conn).await?;
    debug!(existing = seen.len(), "Loaded stored urls");

    let fresh: Vec<&Article> = records
        .iter()
        .filter(|a| a.url.as_ref().is_none_or(|url| seen.insert(url.clone())))
        .collect();
    if fresh.is_empty() {
        return Ok(0);
    }

    let mut tx = conn.begin().await?;
    for article in &fresh {
        let mut query = sqlx::query::<Sqlite>(&INSERT_ROW);
        for column in Article::COLUMNS {
            query = query.bind(article.text(column));
        }
        query.execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(fresh.len())
}
