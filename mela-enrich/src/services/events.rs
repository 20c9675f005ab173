//! Nearby-event call site.
//!
//! Event search cascades outward when the user's city has nothing listed:
//! city (50km), then state (200km), then country-wide (1000km). Whatever
//! rung answers, the payload is cached under the city's key, so the next
//! request for that city skips the cascade entirely until the 6h window
//! closes.

use mela_core::{CacheKey, CascadePlan, EnrichmentKind, MelaResult, SearchScope};
use mela_storage::{KeyValueStore, RefreshMode, ScopeFetcher, TemporalCache};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Search radius for the city rung.
pub const CITY_RADIUS_KM: u32 = 50;
/// Search radius for the state rung.
pub const STATE_RADIUS_KM: u32 = 200;
/// Search radius for the country-wide rung.
pub const COUNTRY_RADIUS_KM: u32 = 1000;

const COUNTRY_NAME: &str = "India";

/// Cascading nearby-event lookup.
pub struct EventFinder<S: KeyValueStore> {
    cache: TemporalCache<S>,
    fetcher: Arc<dyn ScopeFetcher>,
}

impl<S: KeyValueStore> EventFinder<S> {
    /// Create a finder over the given store and search fetcher.
    pub fn new(store: Arc<S>, fetcher: Arc<dyn ScopeFetcher>) -> Self {
        Self {
            cache: TemporalCache::new(store),
            fetcher,
        }
    }

    /// Events near a city, broadening to state and country as needed.
    pub async fn nearby(
        &self,
        city: &str,
        state: Option<&str>,
        refresh: RefreshMode,
    ) -> MelaResult<Vec<Value>> {
        let key = CacheKey::for_city(city, state)?;
        let plan = cascade_plan(city, state)?;
        let events = self
            .cache
            .get_with_cascade(
                EnrichmentKind::NearbyEvents,
                &key,
                &plan,
                refresh,
                self.fetcher.as_ref(),
            )
            .await
            .map_err(|e| {
                warn!(city, error = %e, "nearby event lookup failed");
                e
            })?;
        debug!(key = %key, count = events.len(), "nearby events resolved");
        Ok(events)
    }
}

/// Build the city → state → country plan. A missing state drops the
/// middle rung rather than searching a blank scope.
fn cascade_plan(city: &str, state: Option<&str>) -> MelaResult<CascadePlan> {
    let mut scopes = vec![SearchScope::new(
        format!("artisan fairs and craft events near {}", city.trim()),
        CITY_RADIUS_KM,
    )];
    if let Some(state) = state.map(str::trim).filter(|s| !s.is_empty()) {
        scopes.push(SearchScope::new(
            format!("artisan fairs and craft events in {state}"),
            STATE_RADIUS_KM,
        ));
    }
    scopes.push(SearchScope::new(
        format!("artisan fairs and craft events in {COUNTRY_NAME}"),
        COUNTRY_RADIUS_KM,
    ));
    CascadePlan::new(scopes)
}
