//! HTTP clients for the enrichment upstreams.

pub mod completion;
pub mod search;

pub use completion::CompletionClient;
pub use search::WebSearchClient;

use mela_core::UpstreamError;
use reqwest::StatusCode;

/// Map a non-success HTTP status to the matching upstream error.
pub(crate) fn map_status(upstream: &str, status: StatusCode, message: String) -> UpstreamError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited {
            upstream: upstream.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamError::InvalidApiKey {
            upstream: upstream.to_string(),
        },
        _ => UpstreamError::Unavailable {
            upstream: upstream.to_string(),
            reason: format!("status {status}: {message}"),
        },
    }
}
