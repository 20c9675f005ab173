//! Read-check-fetch-write orchestration.
//!
//! [`TemporalCache`] is the single engine behind every enrichment call
//! site. A read first consults the store; a record that is fresh under
//! the kind's TTL is served without any upstream call. Only an absent,
//! stale, or force-bypassed record reaches the fetcher, and only a
//! successful fetch replaces the stored payload.

use async_trait::async_trait;
use mela_core::{CacheKey, CacheRecord, CascadePlan, EnrichmentKind, MelaResult, SearchScope};
use serde_json::Value;
use std::sync::Arc;

use super::cascade::resolve_with_cascade;
use super::record_store::RecordStore;
use crate::KeyValueStore;

/// Refresh requirement for enrichment reads.
///
/// Callers state up front whether a fresh cached payload satisfies them,
/// making the cache-bypass path explicit instead of a hidden boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Serve the cached payload when it is fresh; fetch otherwise.
    #[default]
    CachedOrFetch,
    /// Skip the freshness check and fetch unconditionally. The result
    /// still replaces the cached record.
    ForceRefresh,
}

impl RefreshMode {
    /// Returns true when the cache must be bypassed.
    pub fn is_forced(&self) -> bool {
        matches!(self, RefreshMode::ForceRefresh)
    }
}

/// Upstream lookup capability supplied by the caller.
///
/// The engine is oblivious to what sits behind this seam (an LLM, a web
/// search API). Implementations own their credentials, retry policy, and
/// timeouts; the engine adds none of those.
#[async_trait]
pub trait ScopeFetcher: Send + Sync {
    /// Fetch results for one search scope. An empty result set is a
    /// legitimate answer, distinct from a failed call.
    async fn fetch(&self, scope: &SearchScope) -> MelaResult<Vec<Value>>;
}

/// Staleness-bounded cache over a [`KeyValueStore`].
///
/// # Concurrency
///
/// Each `get` is an independent async operation; there is no per-key
/// lock or in-flight de-duplication. Two concurrent requests for the
/// same stale key may both observe staleness, both fetch, and both
/// upsert - last write wins. Results are idempotent third-party reads,
/// so this is a cost/rate-limit concern rather than a correctness one.
pub struct TemporalCache<S: KeyValueStore> {
    records: RecordStore<S>,
}

impl<S: KeyValueStore> TemporalCache<S> {
    /// Create a cache over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            records: RecordStore::new(store),
        }
    }

    /// The typed record layer, for unconditional reads past the
    /// freshness gate.
    pub fn records(&self) -> &RecordStore<S> {
        &self.records
    }

    /// Serve a key from cache or fetch it from the single given scope.
    ///
    /// On fetcher failure the error propagates and the stored record -
    /// fresh or stale - is left untouched and NOT served automatically;
    /// the caller decides whether stale data is acceptable.
    pub async fn get<F>(
        &self,
        kind: EnrichmentKind,
        key: &CacheKey,
        scope: &SearchScope,
        mode: RefreshMode,
        fetcher: &F,
    ) -> MelaResult<Vec<Value>>
    where
        F: ScopeFetcher + ?Sized,
    {
        if let Some(payload) = self.cached_payload(kind, key, mode).await? {
            return Ok(payload);
        }
        let payload = fetcher.fetch(scope).await?;
        self.store_payload(kind, key, payload).await
    }

    /// Serve a key from cache or resolve it through a scope cascade.
    ///
    /// The payload is cached under the NARROWEST scope's key even when a
    /// broader fallback produced it, so subsequent requests for the same
    /// narrow scope skip the whole cascade until the record expires. An
    /// exhausted cascade caches its empty outcome the same way.
    pub async fn get_with_cascade<F>(
        &self,
        kind: EnrichmentKind,
        key: &CacheKey,
        plan: &CascadePlan,
        mode: RefreshMode,
        fetcher: &F,
    ) -> MelaResult<Vec<Value>>
    where
        F: ScopeFetcher + ?Sized,
    {
        if let Some(payload) = self.cached_payload(kind, key, mode).await? {
            return Ok(payload);
        }
        let payload = resolve_with_cascade(plan, fetcher).await?;
        self.store_payload(kind, key, payload).await
    }

    /// The freshness gate: returns the stored payload only when the
    /// record exists, is fresh under the kind's TTL, and is not voided
    /// by the kind's empty-payload override.
    async fn cached_payload(
        &self,
        kind: EnrichmentKind,
        key: &CacheKey,
        mode: RefreshMode,
    ) -> MelaResult<Option<Vec<Value>>> {
        if mode.is_forced() {
            return Ok(None);
        }
        let Some(record) = self.records.cache_get(kind, key).await? else {
            return Ok(None);
        };
        if !kind.policy().is_fresh_now(record.updated_at) {
            return Ok(None);
        }
        if kind.refetch_on_empty() && record.payload.is_empty() {
            return Ok(None);
        }
        Ok(Some(record.payload))
    }

    async fn store_payload(
        &self,
        kind: EnrichmentKind,
        key: &CacheKey,
        payload: Vec<Value>,
    ) -> MelaResult<Vec<Value>> {
        let record = CacheRecord::new(key.clone(), payload);
        self.records.cache_put(kind, &record).await?;
        Ok(record.payload)
    }
}

impl<S: KeyValueStore> Clone for TemporalCache<S> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}
