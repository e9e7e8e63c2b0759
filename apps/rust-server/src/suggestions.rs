// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client for the upstream search-suggestion service.
//!
//! The upstream speaks the OpenSearch suggestions format: a JSON array whose
//! first element echoes the query and whose second element is the list of
//! suggestions. Anything after that is ignored.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::config::SuggestSettings;

#[derive(Debug, thiserror::Error)]
pub enum SuggestionError {
    #[error("Invalid suggestion service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Suggestion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Suggestion service returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Unexpected suggestion response: {0}")]
    InvalidResponse(&'static str),
}

/// Forwards suggestion queries upstream.
#[derive(Clone)]
pub struct SuggestionClient {
    base_url: Url,
    client: reqwest::Client,
}

impl SuggestionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SuggestionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: Url::parse(base_url)?,
            client,
        })
    }

    pub fn from_settings(settings: &SuggestSettings) -> Result<Self, SuggestionError> {
        Self::new(&settings.base_url, settings.timeout)
    }

    /// Fetch suggestions for `query`. A blank query returns none without
    /// contacting the upstream.
    pub async fn suggest(&self, query: &str) -> Result<Vec<String>, SuggestionError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("client", "firefox")
            .append_pair("ds", "yt")
            .append_pair("q", query);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(SuggestionError::Status(response.status()));
        }

        let body: Value = response.json().await?;
        parse_suggestions(&body)
    }
}

fn parse_suggestions(body: &Value) -> Result<Vec<String>, SuggestionError> {
    let suggestions = body
        .as_array()
        .and_then(|parts| parts.get(1))
        .and_then(Value::as_array)
        .ok_or(SuggestionError::InvalidResponse("missing suggestion list"))?;

    Ok(suggestions
        .iter()
        .filter_map(|s| s.as_str().map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::spawn_suggest_server;
    use serde_json::json;

    #[test]
    fn parses_opensearch_format() {
        let body = json!(["rust", ["rust tutorial", "rust game", 3], {"extra": true}]);
        assert_eq!(
            parse_suggestions(&body).unwrap(),
            vec!["rust tutorial", "rust game"]
        );
    }

    #[test]
    fn rejects_unexpected_shape() {
        assert!(parse_suggestions(&json!({"suggestions": []})).is_err());
        assert!(parse_suggestions(&json!(["rust"])).is_err());
    }

    #[tokio::test]
    async fn forwards_query_and_returns_suggestions() {
        let server = spawn_suggest_server(json!(["lofi", ["lofi hip hop", "lofi girl"]])).await;
        let client = SuggestionClient::new(&server.url, Duration::from_secs(2)).unwrap();

        let suggestions = client.suggest("lofi beats").await.unwrap();
        assert_eq!(suggestions, vec!["lofi hip hop", "lofi girl"]);

        let seen = server.last_query().unwrap();
        assert!(seen.contains("client=firefox"));
        assert!(seen.contains("ds=yt"));
        assert!(seen.contains("q=lofi+beats"));
    }

    #[tokio::test]
    async fn blank_query_skips_upstream() {
        let server = spawn_suggest_server(json!(["", []])).await;
        let client = SuggestionClient::new(&server.url, Duration::from_secs(2)).unwrap();

        assert!(client.suggest("   ").await.unwrap().is_empty());
        assert_eq!(server.hits(), 0);
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = spawn_suggest_server(json!(["q", ["a"]])).await;
        server.set_delay(Duration::from_secs(2));
        let client = SuggestionClient::new(&server.url, Duration::from_millis(200)).unwrap();

        let result = client.suggest("q").await;
        assert!(matches!(result, Err(SuggestionError::Request(e)) if e.is_timeout()));
    }

    #[tokio::test]
    async fn upstream_error_status_is_reported() {
        let server = spawn_suggest_server(json!(["q", ["a"]])).await;
        server.set_status(503);
        let client = SuggestionClient::new(&server.url, Duration::from_secs(2)).unwrap();

        let result = client.suggest("q").await;
        assert!(matches!(result, Err(SuggestionError::Status(status)) if status.as_u16() == 503));
    }
}
