//! AI report call site: trend, funding, and insight reports.
//!
//! Reports live in the append-only ledger rather than a mutable cache
//! slot, because the generation history is itself a product surface
//! (funding and insight evolution over time). The service applies the
//! shared half-open freshness rule to the latest record and regenerates
//! when it is stale, absent, or force-bypassed.

use async_trait::async_trait;
use mela_core::{EnrichmentKind, MelaResult, ReportRecord, ReportType};
use mela_storage::{KeyValueStore, RefreshMode, ReportLedger};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::upstream::CompletionClient;

/// Report generation capability, injected with its credentials at
/// process start.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Generate a fresh report body.
    async fn generate(&self, report_type: ReportType, owner_id: Option<&str>)
        -> MelaResult<Value>;
}

#[async_trait]
impl ReportGenerator for CompletionClient {
    async fn generate(
        &self,
        report_type: ReportType,
        owner_id: Option<&str>,
    ) -> MelaResult<Value> {
        let prompt = match report_type {
            ReportType::Trends => {
                "Summarize current market trends across Indian handicraft categories.".to_string()
            }
            ReportType::Funding => format!(
                "List funding opportunities relevant to artisan {}.",
                owner_id.unwrap_or("profile")
            ),
            ReportType::Insights => format!(
                "Produce business insights for artisan {}.",
                owner_id.unwrap_or("profile")
            ),
        };
        self.complete(&prompt).await
    }
}

/// Ledger-backed report service.
pub struct ReportService<S: KeyValueStore> {
    ledger: ReportLedger<S>,
    generator: Arc<dyn ReportGenerator>,
}

impl<S: KeyValueStore> ReportService<S> {
    /// Create a service over the given store and generator.
    pub fn new(store: Arc<S>, generator: Arc<dyn ReportGenerator>) -> Self {
        Self {
            ledger: ReportLedger::new(store),
            generator,
        }
    }

    /// The current report for `(type, owner)`.
    ///
    /// Serves the latest ledger record when it is inside the 24h window
    /// and the caller did not force a refresh; otherwise generates a new
    /// report and appends it. Platform-wide types always resolve with no
    /// owner, whatever the caller passed.
    pub async fn current(
        &self,
        report_type: ReportType,
        owner_id: Option<&str>,
        refresh: RefreshMode,
    ) -> MelaResult<Value> {
        let owner_id = if report_type.is_platform_wide() {
            if owner_id.is_some() {
                warn!(?report_type, "ignoring owner for platform-wide report");
            }
            None
        } else {
            owner_id
        };

        if !refresh.is_forced() {
            if let Some(latest) = self.ledger.latest(report_type, owner_id).await? {
                if EnrichmentKind::Reports
                    .policy()
                    .is_fresh_now(latest.generated_at)
                {
                    debug!(?report_type, owner = ?owner_id, "serving ledger report");
                    return Ok(latest.payload);
                }
            }
        }

        let payload = self
            .generator
            .generate(report_type, owner_id)
            .await
            .map_err(|e| {
                warn!(?report_type, owner = ?owner_id, error = %e, "report generation failed");
                e
            })?;
        let record = self.ledger.append(report_type, owner_id, payload).await?;
        debug!(?report_type, owner = ?owner_id, report_id = %record.report_id, "appended report");
        Ok(record.payload)
    }

    /// Full generation history for `(type, owner)`, oldest first.
    pub async fn history(
        &self,
        report_type: ReportType,
        owner_id: Option<&str>,
    ) -> MelaResult<Vec<ReportRecord>> {
        let owner_id = if report_type.is_platform_wide() {
            None
        } else {
            owner_id
        };
        self.ledger.history(report_type, owner_id).await
    }
}
