//! Enrichment call sites.
//!
//! Each service is a thin configuration over the cache engine: a kind, a
//! key derivation, an optional scope cascade, and an injected fetcher or
//! generator. None of them hand-roll the read-check-fetch-write sequence.

pub mod events;
pub mod materials;
pub mod reports;
pub mod schemes;

pub use events::EventFinder;
pub use materials::MaterialFinder;
pub use reports::{ReportGenerator, ReportService};
pub use schemes::SchemeFinder;
