//! MELA Core - Enrichment Data Types
//!
//! Pure data structures and policies for the temporal enrichment cache.
//! All other crates depend on this. This crate contains ONLY data types and
//! pure policy logic - no I/O, no clocks other than comparisons the caller
//! feeds in, no upstream knowledge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Report identifier using UUIDv7 for timestamp-sortable IDs.
pub type ReportId = Uuid;

/// Generate a new UUIDv7 ReportId (timestamp-sortable).
pub fn new_report_id() -> ReportId {
    Uuid::now_v7()
}

// ============================================================================
// ENRICHMENT KINDS
// ============================================================================

/// The kind of AI-generated report kept in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    /// Platform-wide market trend report. Never owned by a single artisan.
    Trends,
    /// Funding opportunities for one artisan.
    Funding,
    /// Business insights for one artisan.
    Insights,
}

impl ReportType {
    /// Stable string form used in storage keys.
    pub fn slug(&self) -> &'static str {
        match self {
            ReportType::Trends => "trends",
            ReportType::Funding => "funding",
            ReportType::Insights => "insights",
        }
    }

    /// Platform-wide report types carry no owner.
    pub fn is_platform_wide(&self) -> bool {
        matches!(self, ReportType::Trends)
    }
}

/// Data kinds served through the enrichment cache.
///
/// Each kind owns one logical storage collection and one freshness window,
/// so cross-kind interference is impossible by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentKind {
    /// AI trend/funding/insight reports (append-only ledger, 24h window).
    Reports,
    /// Nearby artisan events found via web search (6h window, scope cascade).
    NearbyEvents,
    /// Government schemes for a state (12h window).
    GovernmentSchemes,
    /// Raw-material supplier search by free-text query (24h window).
    RawMaterials,
}

impl EnrichmentKind {
    /// Freshness window for this kind.
    pub fn ttl(&self) -> Duration {
        const HOUR: u64 = 3600;
        match self {
            EnrichmentKind::Reports => Duration::from_secs(24 * HOUR),
            EnrichmentKind::NearbyEvents => Duration::from_secs(6 * HOUR),
            EnrichmentKind::GovernmentSchemes => Duration::from_secs(12 * HOUR),
            EnrichmentKind::RawMaterials => Duration::from_secs(24 * HOUR),
        }
    }

    /// Name of the storage collection holding this kind's records.
    pub fn collection(&self) -> &'static str {
        match self {
            EnrichmentKind::Reports => "ai_reports",
            EnrichmentKind::NearbyEvents => "nearby_events",
            EnrichmentKind::GovernmentSchemes => "government_schemes",
            EnrichmentKind::RawMaterials => "raw_materials",
        }
    }

    /// Whether a fresh record holding an EMPTY payload must be refetched.
    ///
    /// Schemes are assumed genuinely available for every state, so a
    /// persisted empty result is presumed to be a prior fetch failure
    /// rather than a true negative. No other kind behaves this way.
    pub fn refetch_on_empty(&self) -> bool {
        matches!(self, EnrichmentKind::GovernmentSchemes)
    }

    /// The freshness policy for this kind.
    pub fn policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(self.ttl())
    }
}

// ============================================================================
// FRESHNESS POLICY
// ============================================================================

/// Rule mapping a record's age to fresh/stale given a TTL.
///
/// Freshness is a half-open window: `now - updated_at < ttl` is fresh.
/// A record aged exactly `ttl` is stale and must be refetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    ttl: Duration,
}

impl FreshnessPolicy {
    /// Create a policy with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// The TTL this policy enforces.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Check whether a record written at `updated_at` is fresh at `now`.
    ///
    /// Records timestamped in the future (clock skew between writers) are
    /// treated as fresh rather than underflowing the age calculation.
    pub fn is_fresh(&self, updated_at: Timestamp, now: Timestamp) -> bool {
        match now.signed_duration_since(updated_at).to_std() {
            Ok(age) => age < self.ttl,
            // Negative age: updated_at is ahead of now.
            Err(_) => true,
        }
    }

    /// Check freshness against the current wall clock.
    pub fn is_fresh_now(&self, updated_at: Timestamp) -> bool {
        self.is_fresh(updated_at, Utc::now())
    }
}

// ============================================================================
// CACHE KEYS
// ============================================================================

/// Normalized logical identity of a cache record.
///
/// A `CacheKey` can only be obtained through the deriving constructors
/// below, so every key in the store is normalized by construction:
/// trimmed, lower-cased, internal whitespace runs collapsed to a single
/// underscore.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a city-scoped lookup: `city` or `city_state`.
    pub fn for_city(city: &str, state: Option<&str>) -> MelaResult<Self> {
        let city = normalize(city);
        if city.is_empty() {
            return Err(MelaError::Validation(ValidationError::BlankKeyInput {
                field: "city".to_string(),
            }));
        }
        let key = match state.map(normalize).filter(|s| !s.is_empty()) {
            Some(state) => format!("{city}_{state}"),
            None => city,
        };
        Ok(Self(key))
    }

    /// Key for a state-scoped lookup. A missing state falls back to the
    /// country-wide default `"india"`.
    pub fn for_state(state: Option<&str>) -> Self {
        match state.map(normalize).filter(|s| !s.is_empty()) {
            Some(state) => Self(state),
            None => Self("india".to_string()),
        }
    }

    /// Key for a free-text query lookup.
    pub fn for_query(query: &str) -> MelaResult<Self> {
        let key = normalize(query);
        if key.is_empty() {
            return Err(MelaError::Validation(ValidationError::BlankKeyInput {
                field: "query".to_string(),
            }));
        }
        Ok(Self(key))
    }

    /// The normalized key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-case and collapse whitespace runs to single underscores.
fn normalize(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

// ============================================================================
// SEARCH SCOPES
// ============================================================================

/// The unit of narrowness/breadth for an upstream search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchScope {
    /// Human-readable query text sent to the upstream (NOT normalized;
    /// normalization is a cache-key concern only).
    pub query: String,
    /// Search radius in kilometres, for upstreams that take one.
    pub radius_km: Option<u32>,
}

impl SearchScope {
    /// A scope with a search radius.
    pub fn new(query: impl Into<String>, radius_km: u32) -> Self {
        Self {
            query: query.into(),
            radius_km: Some(radius_km),
        }
    }

    /// A scope without a radius (free-text or state-level search).
    pub fn query_only(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            radius_km: None,
        }
    }
}

/// Ordered fallback across broadening search scopes, narrowest first.
///
/// Each scope is tried only if all previous scopes produced zero results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    scopes: Vec<SearchScope>,
}

impl CascadePlan {
    /// Create a plan from scopes ordered narrowest first.
    pub fn new(scopes: Vec<SearchScope>) -> MelaResult<Self> {
        if scopes.is_empty() {
            return Err(MelaError::Validation(ValidationError::EmptyCascade));
        }
        Ok(Self { scopes })
    }

    /// The scopes in trial order.
    pub fn scopes(&self) -> &[SearchScope] {
        &self.scopes
    }

    /// The narrowest scope (the one the cache key is derived from).
    pub fn narrowest(&self) -> &SearchScope {
        &self.scopes[0]
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// A single mutable cache slot: the most recent successful fetch for a key.
///
/// Failed fetches never overwrite an existing record; the engine replaces
/// the payload wholesale or leaves it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Normalized logical identity.
    pub key: CacheKey,
    /// Upstream results, opaque to the engine.
    pub payload: Vec<serde_json::Value>,
    /// When the payload was last (re)populated.
    pub updated_at: Timestamp,
}

impl CacheRecord {
    /// Create a record stamped with the current wall clock.
    pub fn new(key: CacheKey, payload: Vec<serde_json::Value>) -> Self {
        Self {
            key,
            payload,
            updated_at: Utc::now(),
        }
    }
}

/// One immutable entry in the report ledger.
///
/// Created by every successful generation; never updated or deleted.
/// "Current" state is derived at read time, not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Timestamp-sortable unique id.
    pub report_id: ReportId,
    /// Which report this is.
    pub report_type: ReportType,
    /// Owning artisan, or None for platform-wide reports.
    pub owner_id: Option<String>,
    /// Generated report body, opaque to the engine.
    pub payload: serde_json::Value,
    /// When this report was generated.
    pub generated_at: Timestamp,
}

impl ReportRecord {
    /// Create a record stamped with the current wall clock.
    pub fn new(
        report_type: ReportType,
        owner_id: Option<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            report_id: new_report_id(),
            report_type,
            owner_id,
            payload,
            generated_at: Utc::now(),
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Document-store errors. Fatal to the call; the engine never buffers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Corrupt record in {collection}: {reason}")]
    CorruptRecord { collection: String, reason: String },
}

/// Upstream lookup errors. The cache is left at its prior state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Upstream {upstream} unavailable: {reason}")]
    Unavailable { upstream: String, reason: String },

    #[error("Malformed payload from {upstream}: {reason}")]
    MalformedPayload { upstream: String, reason: String },

    #[error("Rate limited by {upstream}")]
    RateLimited { upstream: String },

    #[error("Invalid API key for {upstream}")]
    InvalidApiKey { upstream: String },
}

/// Request validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Blank input for key field: {field}")]
    BlankKeyInput { field: String },

    #[error("Cascade plan has no scopes")]
    EmptyCascade,
}

/// Master error type for all MELA operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MelaError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for MELA operations.
pub type MelaResult<T> = Result<T, MelaError>;

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
