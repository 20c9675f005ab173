//! Government-scheme call site.
//!
//! Scheme lookups are state-scoped with a country-wide default and a 12h
//! window. Unlike every other kind, a fresh record holding an empty
//! payload is refetched anyway: schemes are assumed genuinely available
//! for every state, so a persisted empty result is presumed to be a prior
//! fetch failure rather than a true negative.

use mela_core::{CacheKey, EnrichmentKind, MelaResult, SearchScope};
use mela_storage::{KeyValueStore, RefreshMode, ScopeFetcher, TemporalCache};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const COUNTRY_NAME: &str = "India";

/// State-scoped government-scheme lookup.
pub struct SchemeFinder<S: KeyValueStore> {
    cache: TemporalCache<S>,
    fetcher: Arc<dyn ScopeFetcher>,
}

impl<S: KeyValueStore> SchemeFinder<S> {
    /// Create a finder over the given store and search fetcher.
    pub fn new(store: Arc<S>, fetcher: Arc<dyn ScopeFetcher>) -> Self {
        Self {
            cache: TemporalCache::new(store),
            fetcher,
        }
    }

    /// Schemes for a state, or country-wide when no state is given.
    pub async fn for_state(
        &self,
        state: Option<&str>,
        refresh: RefreshMode,
    ) -> MelaResult<Vec<Value>> {
        let key = CacheKey::for_state(state);
        let region = state
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(COUNTRY_NAME);
        let scope = SearchScope::query_only(format!(
            "government schemes for artisans and craftspeople in {region}"
        ));

        let schemes = self
            .cache
            .get(
                EnrichmentKind::GovernmentSchemes,
                &key,
                &scope,
                refresh,
                self.fetcher.as_ref(),
            )
            .await
            .map_err(|e| {
                warn!(region, error = %e, "scheme lookup failed");
                e
            })?;
        debug!(key = %key, count = schemes.len(), "schemes resolved");
        Ok(schemes)
    }
}
