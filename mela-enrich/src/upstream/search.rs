//! Client for the web-search upstream.

use async_trait::async_trait;
use mela_core::{MelaResult, SearchScope, UpstreamError};
use mela_storage::ScopeFetcher;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const UPSTREAM: &str = "web_search";

/// Default number of results requested per search.
const DEFAULT_RESULT_LIMIT: u32 = 10;

/// Web-search API client.
///
/// Timeouts and retries are this client's responsibility, not the cache
/// engine's; the engine only sees `fetch` succeed, fail, or come back
/// empty.
pub struct WebSearchClient {
    client: Client,
    api_key: String,
    base_url: String,
    result_limit: u32,
}

impl WebSearchClient {
    /// Create a new client with the default result limit.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.websearch.example.com/v1".to_string(),
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }

    /// Override the upstream base URL (self-hosted gateways, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-search result limit.
    pub fn with_result_limit(mut self, limit: u32) -> Self {
        self.result_limit = limit.max(1);
        self
    }

    /// Run one search. An empty `results` array is a valid answer.
    pub async fn search(&self, query: &str, radius_km: Option<u32>) -> MelaResult<Vec<Value>> {
        let body = SearchRequest {
            query,
            limit: self.result_limit,
            radius_km,
        };
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Unavailable {
                upstream: UPSTREAM.to_string(),
                reason: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if status.is_success() {
            let parsed: SearchResponse =
                response.json().await.map_err(|e| UpstreamError::MalformedPayload {
                    upstream: UPSTREAM.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(parsed.results)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(super::map_status(UPSTREAM, status, message).into())
        }
    }
}

#[async_trait]
impl ScopeFetcher for WebSearchClient {
    async fn fetch(&self, scope: &SearchScope) -> MelaResult<Vec<Value>> {
        self.search(&scope.query, scope.radius_km).await
    }
}

impl std::fmt::Debug for WebSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSearchClient")
            .field("base_url", &self.base_url)
            .field("result_limit", &self.result_limit)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    radius_km: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<Value>,
}
