//! Data models for headline records as they move through the pipeline.
//!
//! - [`HeadlinesResponse`]: the top-headlines API envelope
//! - [`RawArticle`]: one article exactly as the API returns it
//! - [`Article`]: an enriched record, the shape stored in every sink
//!
//! Field names use camelCase to match the upstream JSON and the column
//! names of the stored table, hence the `#[allow(non_snake_case)]`
//! attributes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The JSON body returned by the top-headlines endpoint.
///
/// Only `articles` is used. A body without it is read as zero articles.
#[allow(non_snake_case)]
#[derive(Debug, Default, Deserialize)]
pub struct HeadlinesResponse {
    /// `"ok"` or `"error"` as reported by the API.
    #[serde(default)]
    pub status: Option<String>,
    /// Total hits across all pages, of which we only ever read the first.
    #[serde(default)]
    pub totalResults: Option<u64>,
    #[serde(default)]
    pub articles: Option<Vec<RawArticle>>,
}

/// The `source` field of an upstream article.
///
/// The API sends `{"id": ..., "name": ...}`, but plain strings show up in
/// older archives and other feeds.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawSource {
    Named {
        /// Usually a slug or `null`; kept as-is since feeds disagree on its type.
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        name: Option<String>,
    },
    Plain(String),
    Other(Value),
}

impl RawSource {
    /// Collapse the source to the single string stored in the sinks.
    ///
    /// A nested source without a `name` becomes the empty string.
    pub fn into_name(self) -> String {
        match self {
            RawSource::Named { name, .. } => name.unwrap_or_default(),
            RawSource::Plain(s) => s,
            RawSource::Other(v) => v.to_string(),
        }
    }
}

/// One article as returned by the headlines API, before enrichment.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawArticle {
    #[serde(default)]
    pub source: Option<RawSource>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub urlToImage: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub publishedAt: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub content: Option<String>,
    /// Anything else the API sends along.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An enriched headline record.
///
/// This is what the CSV snapshot, the `batch_news` table and the JSON
/// archive hold, and what the cleaner reads back. `source` is always the
/// flattened name; `category` and `country` are attached at ingestion.
///
/// Fields the model does not name are kept in `extra` so that a round
/// trip through the archive never drops data.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Article {
    #[serde(default, deserialize_with = "deserialize_source")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub urlToImage: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub publishedAt: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub country: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Article {
    /// Named columns in their canonical order. This is also the schema of
    /// the `batch_news` table.
    pub const COLUMNS: [&'static str; 10] = [
        "source",
        "author",
        "title",
        "description",
        "url",
        "urlToImage",
        "publishedAt",
        "content",
        "category",
        "country",
    ];

    /// Value of a named column as JSON. Unknown names are looked up in
    /// `extra`; anything absent is `null`.
    pub fn field(&self, name: &str) -> Value {
        let named = match name {
            "source" => &self.source,
            "author" => &self.author,
            "title" => &self.title,
            "description" => &self.description,
            "url" => &self.url,
            "urlToImage" => &self.urlToImage,
            "publishedAt" => &self.publishedAt,
            "content" => &self.content,
            "category" => &self.category,
            "country" => &self.country,
            other => return self.extra.get(other).cloned().unwrap_or(Value::Null),
        };
        named.clone().map(Value::String).unwrap_or(Value::Null)
    }

    /// Text of a named column, if it is a string.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.field(name) {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Null out a column. Returns `true` if the column held a value.
    pub fn clear_field(&mut self, name: &str) -> bool {
        let named = match name {
            "source" => &mut self.source,
            "author" => &mut self.author,
            "title" => &mut self.title,
            "description" => &mut self.description,
            "url" => &mut self.url,
            "urlToImage" => &mut self.urlToImage,
            "publishedAt" => &mut self.publishedAt,
            "content" => &mut self.content,
            "category" => &mut self.category,
            "country" => &mut self.country,
            other => return self.extra.remove(other).is_some(),
        };
        named.take().is_some()
    }

    /// The record as a JSON object: named columns in canonical order, then
    /// the extra fields. Same shape as its serde serialization.
    pub fn to_object(&self) -> Map<String, Value> {
        let mut object: Map<String, Value> = Self::COLUMNS
            .iter()
            .map(|c| (c.to_string(), self.field(c)))
            .collect();
        object.extend(self.extra.clone());
        object
    }

    /// Project the record onto `columns`, in that order.
    pub fn to_row(&self, columns: &[String]) -> Map<String, Value> {
        columns
            .iter()
            .map(|c| (c.clone(), self.field(c)))
            .collect()
    }
}

/// Accept either a flattened source name or the nested API object.
fn deserialize_source<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawSource>::deserialize(deserializer)?;
    Ok(raw.map(RawSource::into_name))
}

/// Read a text column, treating any non-string value as absent.
///
/// Archives written by other tools sometimes hold numbers or objects in
/// text columns; one such record must not fail the whole load.
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Render a cell value the way it appears in a CSV file: strings verbatim,
/// `null` as an empty cell, anything else as compact JSON.
pub fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headlines_response_without_articles() {
        let resp: HeadlinesResponse =
            serde_json::from_str(r#"{"status": "ok", "totalResults": 0}"#).unwrap();
        assert_eq!(resp.status.as_deref(), Some("ok"));
        assert!(resp.articles.unwrap_or_default().is_empty());
    }

    #[test]
    fn test_raw_article_nested_source() {
        let raw: RawArticle = serde_json::from_value(json!({
            "source": {"id": "espn", "name": "ESPN"},
            "author": null,
            "title": "Game recap",
            "url": "http://a"
        }))
        .unwrap();

        assert_eq!(
            raw.source,
            Some(RawSource::Named {
                id: Some(json!("espn")),
                name: Some("ESPN".to_string())
            })
        );
        assert_eq!(raw.author, None);
        assert_eq!(raw.url.as_deref(), Some("http://a"));
    }

    #[test]
    fn test_raw_source_into_name() {
        let named = RawSource::Named {
            id: None,
            name: None,
        };
        assert_eq!(named.into_name(), "");
        assert_eq!(RawSource::Plain("AP".to_string()).into_name(), "AP");
    }

    #[test]
    fn test_article_accepts_nested_source_from_old_archives() {
        let article: Article = serde_json::from_value(json!({
            "source": {"id": null, "name": "Reuters"},
            "url": "http://a"
        }))
        .unwrap();
        assert_eq!(article.source.as_deref(), Some("Reuters"));
    }

    #[test]
    fn test_nested_source_with_numeric_id() {
        let raw: RawArticle = serde_json::from_value(json!({
            "source": {"id": 5, "name": "X"},
            "url": "http://a"
        }))
        .unwrap();
        assert_eq!(raw.source.map(RawSource::into_name).as_deref(), Some("X"));
    }

    #[test]
    fn test_article_non_string_text_fields_read_as_missing() {
        let article: Article = serde_json::from_value(json!({
            "url": "http://a",
            "title": 12345,
            "author": {"first": "A"},
            "description": "kept"
        }))
        .unwrap();
        assert_eq!(article.title, None);
        assert_eq!(article.author, None);
        assert_eq!(article.description.as_deref(), Some("kept"));
        assert!(article.extra.is_empty());
    }

    #[test]
    fn test_article_keeps_unknown_fields() {
        let article: Article = serde_json::from_value(json!({
            "url": "http://a",
            "sentiment": 0.5
        }))
        .unwrap();
        assert_eq!(article.field("sentiment"), json!(0.5));

        let back = serde_json::to_value(&article).unwrap();
        assert_eq!(back["sentiment"], json!(0.5));
        assert_eq!(back["author"], Value::Null);
    }

    #[test]
    fn test_article_serializes_columns_in_canonical_order() {
        let article = Article {
            url: Some("http://a".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&article).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, Article::COLUMNS.to_vec());
    }

    #[test]
    fn test_to_object_matches_serialization() {
        let mut article = Article {
            url: Some("http://a".to_string()),
            category: Some("sports".to_string()),
            ..Default::default()
        };
        article.extra.insert("sentiment".to_string(), json!(0.5));

        let expected = serde_json::to_value(&article).unwrap();
        assert_eq!(Value::Object(article.to_object()), expected);
    }

    #[test]
    fn test_clear_field() {
        let mut article = Article {
            content: Some("body".to_string()),
            ..Default::default()
        };
        article.extra.insert("x".to_string(), json!(1));

        assert!(article.clear_field("content"));
        assert!(!article.clear_field("content"));
        assert!(article.clear_field("x"));
        assert_eq!(article.content, None);
        assert!(article.extra.is_empty());
    }

    #[test]
    fn test_to_row_projects_columns() {
        let article = Article {
            title: Some("T".to_string()),
            ..Default::default()
        };
        let row = article.to_row(&["title".to_string(), "missing".to_string()]);
        assert_eq!(row["title"], json!("T"));
        assert_eq!(row["missing"], Value::Null);
    }

    #[test]
    fn test_csv_cell() {
        assert_eq!(csv_cell(&Value::Null), "");
        assert_eq!(csv_cell(&json!("a,b")), "a,b");
        assert_eq!(csv_cell(&json!(3)), "3");
    }
}
