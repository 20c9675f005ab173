//! Temporal enrichment cache with explicit refresh contracts.
//!
//! Four marketplace call sites (AI reports, nearby events, government
//! schemes, raw materials) wrap slow, rate-limited, cost-bearing upstream
//! lookups. This module is the one engine behind all of them: each call
//! site becomes a thin configuration (kind, key, optional cascade,
//! fetcher) instead of a hand-rolled copy of the read-check-fetch-write
//! sequence.
//!
//! # Design Philosophy
//!
//! Staleness is explicit. Every read goes through a [`RefreshMode`] and a
//! per-kind freshness window, and the dominant cost-saving path - serving
//! a fresh record without touching the upstream - is checked before any
//! fetch is attempted.
//!
//! # What the engine does NOT do
//!
//! No retries, no timeouts, no single-flight de-duplication: two
//! concurrent requests for the same stale key may both fetch and both
//! upsert, last write wins. Retry and cancellation belong to the injected
//! fetcher; the duplicate-fetch race is an accepted upstream-cost risk.

pub mod cascade;
pub mod ledger;
pub mod record_store;
pub mod temporal;

pub use cascade::resolve_with_cascade;
pub use ledger::ReportLedger;
pub use record_store::RecordStore;
pub use temporal::{RefreshMode, ScopeFetcher, TemporalCache};
