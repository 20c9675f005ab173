//! Raw-material supplier call site.
//!
//! Free-text supplier search with a 24h window. The normalized query text
//! is the cache key, so repeated searches for the same material are
//! served from the store regardless of spacing or casing.

use mela_core::{CacheKey, EnrichmentKind, MelaResult, SearchScope};
use mela_storage::{KeyValueStore, RefreshMode, ScopeFetcher, TemporalCache};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Query-keyed raw-material lookup.
pub struct MaterialFinder<S: KeyValueStore> {
    cache: TemporalCache<S>,
    fetcher: Arc<dyn ScopeFetcher>,
}

impl<S: KeyValueStore> MaterialFinder<S> {
    /// Create a finder over the given store and search fetcher.
    pub fn new(store: Arc<S>, fetcher: Arc<dyn ScopeFetcher>) -> Self {
        Self {
            cache: TemporalCache::new(store),
            fetcher,
        }
    }

    /// Suppliers matching a free-text material query.
    pub async fn search(&self, query: &str, refresh: RefreshMode) -> MelaResult<Vec<Value>> {
        let key = CacheKey::for_query(query)?;
        let scope = SearchScope::query_only(query.trim());

        let suppliers = self
            .cache
            .get(
                EnrichmentKind::RawMaterials,
                &key,
                &scope,
                refresh,
                self.fetcher.as_ref(),
            )
            .await
            .map_err(|e| {
                warn!(query, error = %e, "raw material lookup failed");
                e
            })?;
        debug!(key = %key, count = suppliers.len(), "raw materials resolved");
        Ok(suppliers)
    }
}
