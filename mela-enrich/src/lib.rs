//! MELA Enrich - Upstream Clients and Call-Site Services
//!
//! The capability layer around the cache engine. HTTP clients for the
//! generative-AI and web-search upstreams live here, constructed once at
//! process start with their credentials and injected into the services;
//! the engine itself never holds a credential.
//!
//! Each marketplace call site (AI reports, nearby events, government
//! schemes, raw materials) is a thin configuration over
//! [`mela_storage::TemporalCache`] or [`mela_storage::ReportLedger`]:
//! a kind, a key derivation, an optional scope cascade, and a fetcher.

pub mod services;
pub mod upstream;

pub use services::{
    EventFinder, MaterialFinder, ReportGenerator, ReportService, SchemeFinder,
};
pub use upstream::{CompletionClient, WebSearchClient};
