//! Top-headlines API client.
//!
//! A run issues exactly one GET for one category/country pair and reads
//! only the first page of results. There is no retry: a transport error,
//! a non-success status or an unparseable body ends the run.

use crate::error::{PipelineError, Result};
use crate::models::{HeadlinesResponse, RawArticle};
use crate::utils::truncate_for_log;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};
use url::Url;

/// Build the HTTP client used for the headlines request.
///
/// With `timeout_secs` unset the request may block indefinitely.
pub fn build_client(timeout_secs: Option<u64>) -> Result<reqwest::Client> {
    let mut builder =
        reqwest::Client::builder().user_agent(concat!("news_batch/", env!("CARGO_PKG_VERSION")));
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Build the request URL with the `country`, `category` and `apiKey`
/// query parameters.
pub fn headlines_url(endpoint: &str, country: &str, category: &str, api_key: &str) -> Result<Url> {
    let url = Url::parse_with_params(
        endpoint,
        &[
            ("country", country),
            ("category", category),
            ("apiKey", api_key),
        ],
    )?;
    Ok(url)
}

/// Fetch one page of top headlines.
///
/// # Returns
///
/// The `articles` array of the response, or an empty vector when the body
/// has no `articles` field.
///
/// # Arguments
///
/// * `client` - Shared HTTP client from [`build_client`]
/// * `endpoint` - Top-headlines URL without query parameters
/// * `country` / `category` - Request filters
/// * `api_key` - Sent as the `apiKey` parameter; never logged
///
/// # Returns
///
/// The articles of the first page, in API order.
///
/// # Errors
///
/// - [`PipelineError::Http`] on connection failure or timeout
/// - [`PipelineError::HttpStatus`] on any non-2xx status
/// - [`PipelineError::Payload`] if the body is not the expected JSON
#[instrument(level = "info", skip(client, api_key))]
pub async fn fetch_headlines(
    client: &reqwest::Client,
    endpoint: &str,
    country: &str,
    category: &str,
    api_key: &str,
) -> Result<Vec<RawArticle>> {
    let url = headlines_url(endpoint, country, category, api_key)?;
    let t0 = Instant::now();

    let response = client.get(url).send().await?;
    let status = response.status();
    let body = response.text().await?;
    let dt = t0.elapsed();

    if !status.is_success() {
        error!(%status, elapsed_ms = dt.as_millis() as u64, "Headlines request rejected");
        return Err(PipelineError::HttpStatus {
            status,
            body: truncate_for_log(&body, 300),
        });
    }

    let parsed: HeadlinesResponse = serde_json::from_str(&body).map_err(|e| {
        debug!(body = %truncate_for_log(&body, 300), "Unparseable headlines body");
        PipelineError::Payload(e)
    })?;

    let articles = parsed.articles.unwrap_or_default();
    info!(
        count = articles.len(),
        total_results = parsed.totalResults,
        status = parsed.status.as_deref().unwrap_or("-"),
        elapsed_ms = dt.as_millis() as u64,
        "Fetched headlines"
    );
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawSource;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_headlines_url_has_query_params() {
        let url = headlines_url("https://newsapi.org/v2/top-headlines", "us", "sports", "k&y")
            .unwrap();
        assert_eq!(url.path(), "/v2/top-headlines");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("country".to_string(), "us".to_string()),
                ("category".to_string(), "sports".to_string()),
                ("apiKey".to_string(), "k&y".to_string()),
            ]
        );
    }

    #[test]
    fn test_headlines_url_rejects_garbage() {
        assert!(matches!(
            headlines_url("not a url", "us", "sports", "k"),
            Err(PipelineError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_headlines_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/top-headlines"))
            .and(query_param("country", "us"))
            .and(query_param("category", "sports"))
            .and(query_param("apiKey", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "totalResults": 1,
                "articles": [{
                    "source": {"id": "espn", "name": "ESPN"},
                    "author": null,
                    "title": "Finals tonight",
                    "description": null,
                    "url": "http://a",
                    "urlToImage": null,
                    "publishedAt": "2024-05-01T12:00:00Z",
                    "content": null
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_client(None).unwrap();
        let endpoint = format!("{}/v2/top-headlines", server.uri());
        let articles = fetch_headlines(&client, &endpoint, "us", "sports", "secret")
            .await
            .unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title.as_deref(), Some("Finals tonight"));
        assert!(matches!(articles[0].source, Some(RawSource::Named { .. })));
    }

    #[tokio::test]
    async fn test_fetch_headlines_without_articles_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let client = build_client(Some(5)).unwrap();
        let articles = fetch_headlines(&client, &server.uri(), "us", "sports", "k")
            .await
            .unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_headlines_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": "error",
                "code": "apiKeyInvalid",
                "message": "Your API key is invalid"
            })))
            .mount(&server)
            .await;

        let client = build_client(None).unwrap();
        let err = fetch_headlines(&client, &server.uri(), "us", "sports", "bad")
            .await
            .unwrap_err();

        match err {
            PipelineError::HttpStatus { status, body } => {
                assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
                assert!(body.contains("apiKeyInvalid"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_headlines_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = build_client(None).unwrap();
        let err = fetch_headlines(&client, &server.uri(), "us", "sports", "k")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Payload(_)));
    }
}
