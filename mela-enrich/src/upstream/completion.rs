//! Rate-limited client for the generative-AI upstream.

use mela_core::{MelaResult, UpstreamError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

const UPSTREAM: &str = "completion_api";

/// Upper bound on generated report size.
const MAX_REPORT_TOKENS: u32 = 2048;

/// Generative-AI completion client with request pacing.
///
/// The upstream bills per call and rate-limits aggressively, so the
/// client holds a semaphore permit per in-flight request and enforces a
/// minimum interval between request starts.
pub struct CompletionClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    rate_limiter: Arc<Semaphore>,
    last_request: Arc<Mutex<Option<Instant>>>,
    min_request_interval: Duration,
}

impl CompletionClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_key` - Upstream API key
    /// * `model` - Model identifier sent with every request
    /// * `requests_per_minute` - Maximum request rate (clamped to >= 1)
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        requests_per_minute: u32,
    ) -> Self {
        let rpm = requests_per_minute.max(1);
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.completion.example.com/v1".to_string(),
            model: model.into(),
            rate_limiter: Arc::new(Semaphore::new(rpm as usize)),
            last_request: Arc::new(Mutex::new(None)),
            min_request_interval: Duration::from_millis((60_000 / rpm as u64).max(10)),
        }
    }

    /// Override the upstream base URL (self-hosted gateways, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Run one completion and return the upstream's JSON output.
    pub async fn complete(&self, prompt: &str) -> MelaResult<Value> {
        let _permit = self.rate_limiter.acquire().await.map_err(|e| {
            UpstreamError::Unavailable {
                upstream: UPSTREAM.to_string(),
                reason: format!("rate limiter closed: {e}"),
            }
        })?;
        self.pace().await;

        let body = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: MAX_REPORT_TOKENS,
        };
        let response = self
            .client
            .post(format!("{}/completions", self.base_url))
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
            let parsed: CompletionResponse =
                response.json().await.map_err(|e| UpstreamError::MalformedPayload {
                    upstream: UPSTREAM.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(parsed.output)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(super::map_status(UPSTREAM, status, message).into())
        }
    }

    /// Enforce the minimum interval between request starts.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_request_interval {
                tokio::time::sleep(self.min_request_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    /// Structured report body produced by the model.
    output: Value,
}
