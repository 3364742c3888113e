//! Sinks that ingested and cleaned records are written to.
//!
//! # Submodules
//!
//! - [`csv`]: Per-run CSV snapshots and the cleaned CSV table
//! - [`json`]: The deduplicated JSON archive and the cleaned JSON array
//! - [`sqlite`]: The append-only `batch_news` table
//!
//! # Output Structure
//!
//! ```text
//! batch_output/
//! ├── sports_us_2024-05-01_09-00-00.csv   # one snapshot per ingest run
//! ├── sports_us_2024-05-01_15-00-00.csv
//! └── output.json                         # archive, rewritten every run
//! tech_news.db                            # batch_news table
//! cleaned_output.json                     # written by `clean`
//! cleaned_output.csv
//! ```

pub mod csv;
pub mod json;
pub mod sqlite;
