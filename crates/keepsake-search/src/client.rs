// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web search client speaking the Google Custom Search protocol.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use keepsake_core::KeepsakeError;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// The backend caps `num` at 10.
const MAX_RESULTS: u8 = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

/// HTTP client for the web search backend.
pub struct SearchClient {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    num_results: u8,
    endpoint: String,
}

impl SearchClient {
    pub fn new(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        num_results: u8,
    ) -> Result<Self, KeepsakeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| KeepsakeError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            num_results: num_results.clamp(1, MAX_RESULTS),
            endpoint: SEARCH_ENDPOINT.to_string(),
        })
    }

    /// Overrides the search endpoint, for self-hosted proxies and tests.
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Executes one search. Non-200 responses surface as
    /// [`KeepsakeError::SearchFailed`] with status and body.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, KeepsakeError> {
        let num = self.num_results.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| KeepsakeError::Internal(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KeepsakeError::SearchFailed {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| KeepsakeError::Internal(format!("failed to parse search response: {e}")))?;
        debug!(query, results = parsed.items.len(), "search completed");
        Ok(parsed.items)
    }
}

/// Renders results as a numbered Markdown list. An empty result set renders
/// a fixed "no results" string rather than an empty block.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No search results found.".to_string();
    }

    let mut formatted = String::from("**Search Results:**\n\n");
    for (i, result) in results.iter().enumerate() {
        formatted.push_str(&format!("{}. **{}**\n", i + 1, result.title));
        formatted.push_str(&format!("   URL: {}\n", result.link));
        formatted.push_str(&format!("   {}\n\n", result.snippet));
    }
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, num: u8) -> SearchClient {
        SearchClient::new("search-key", "cse-id", num)
            .unwrap()
            .with_endpoint(format!("{}/customsearch/v1", server.uri()))
    }

    #[tokio::test]
    async fn search_parses_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("key", "search-key"))
            .and(query_param("cx", "cse-id"))
            .and(query_param("q", "rust 1.85 release"))
            .and(query_param("num", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"title": "Rust 1.85", "link": "https://example.com/a", "snippet": "Released."},
                    {"title": "Notes", "link": "https://example.com/b", "snippet": "Details."}
                ]
            })))
            .mount(&server)
            .await;

        let results = client(&server, 5).search("rust 1.85 release").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust 1.85");
    }

    #[tokio::test]
    async fn num_is_clamped_to_backend_cap() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("num", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, 50).search("anything").await.unwrap();
    }

    #[tokio::test]
    async fn non_200_surfaces_as_search_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .mount(&server)
            .await;

        let err = client(&server, 5).search("q").await.unwrap_err();
        match err {
            KeepsakeError::SearchFailed { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "backend exploded");
            }
            other => panic!("expected SearchFailed, got {other}"),
        }
    }

    #[tokio::test]
    async fn missing_items_field_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        assert!(client(&server, 5).search("q").await.unwrap().is_empty());
    }

    #[test]
    fn format_renders_numbered_list() {
        let results = vec![SearchResult {
            title: "Rust 1.85".into(),
            link: "https://example.com".into(),
            snippet: "Released today.".into(),
        }];
        let text = format_results(&results);
        assert!(text.starts_with("**Search Results:**"));
        assert!(text.contains("1. **Rust 1.85**"));
        assert!(text.contains("URL: https://example.com"));
    }

    #[test]
    fn format_empty_uses_fixed_string() {
        assert_eq!(format_results(&[]), "No search results found.");
    }
}
