//! Append-only history of generated AI reports.
//!
//! Reports double as an audit trail: funding and insight evolution over
//! time for a given artisan. Collapsing them into a single mutable slot
//! would destroy that trail, so every generation appends a new record and
//! "current" is derived at read time. The ledger never fetches; deciding
//! whether the latest record is fresh enough is the caller's job, using
//! the same half-open freshness rule as the mutable cache.

use std::sync::Arc;

use mela_core::{MelaResult, ReportRecord, ReportType};
use serde_json::Value;

use super::record_store::RecordStore;
use crate::KeyValueStore;

/// Append-only report store with latest-by-type-and-owner retrieval.
pub struct ReportLedger<S: KeyValueStore> {
    records: RecordStore<S>,
}

impl<S: KeyValueStore> ReportLedger<S> {
    /// Create a ledger over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            records: RecordStore::new(store),
        }
    }

    /// Append a freshly generated report. Always creates a new record;
    /// prior records are never mutated or deleted.
    pub async fn append(
        &self,
        report_type: ReportType,
        owner_id: Option<&str>,
        payload: Value,
    ) -> MelaResult<ReportRecord> {
        let record = ReportRecord::new(report_type, owner_id.map(str::to_owned), payload);
        self.records.ledger_append(&record).await?;
        Ok(record)
    }

    /// The most recent report for an exact `(type, owner)` pair, or None
    /// if none has ever been generated. Owner comparison is exact-match,
    /// including both sides being absent for platform-wide types.
    pub async fn latest(
        &self,
        report_type: ReportType,
        owner_id: Option<&str>,
    ) -> MelaResult<Option<ReportRecord>> {
        let records = self.records.ledger_list(report_type, owner_id).await?;
        // report_id (UUIDv7) breaks ties between equal timestamps.
        Ok(records
            .into_iter()
            .max_by_key(|r| (r.generated_at, r.report_id)))
    }

    /// Full generation history for a `(type, owner)` pair, oldest first.
    pub async fn history(
        &self,
        report_type: ReportType,
        owner_id: Option<&str>,
    ) -> MelaResult<Vec<ReportRecord>> {
        let mut records = self.records.ledger_list(report_type, owner_id).await?;
        records.sort_by_key(|r| (r.generated_at, r.report_id));
        Ok(records)
    }
}

impl<S: KeyValueStore> Clone for ReportLedger<S> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;

    fn make_ledger() -> ReportLedger<MemoryStore> {
        ReportLedger::new(Arc::new(MemoryStore::new()))
    }

    /// Append a record with an explicit generation time, bypassing the
    /// wall-clock stamp `append` applies.
    async fn seed_report(
        ledger: &ReportLedger<MemoryStore>,
        report_type: ReportType,
        owner_id: Option<&str>,
        payload: Value,
        age: ChronoDuration,
    ) -> ReportRecord {
        let mut record = ReportRecord::new(report_type, owner_id.map(str::to_owned), payload);
        record.generated_at = Utc::now() - age;
        ledger.records.ledger_append(&record).await.unwrap();
        record
    }

    #[tokio::test]
    async fn test_latest_of_none_is_none() {
        let ledger = make_ledger();
        let latest = ledger.latest(ReportType::Funding, Some("U1")).await.unwrap();
        assert!(latest.is_none());
    }

    #[tokio::test]
    async fn test_latest_selects_maximum_timestamp() {
        let ledger = make_ledger();
        seed_report(
            &ledger,
            ReportType::Insights,
            Some("U1"),
            json!({"v": 1}),
            ChronoDuration::hours(48),
        )
        .await;
        seed_report(
            &ledger,
            ReportType::Insights,
            Some("U1"),
            json!({"v": 2}),
            ChronoDuration::hours(24),
        )
        .await;
        let newest = seed_report(
            &ledger,
            ReportType::Insights,
            Some("U1"),
            json!({"v": 3}),
            ChronoDuration::hours(1),
        )
        .await;
        // A different owner's record must never be selected for U1.
        seed_report(
            &ledger,
            ReportType::Insights,
            Some("U2"),
            json!({"v": 99}),
            ChronoDuration::minutes(1),
        )
        .await;

        let latest = ledger
            .latest(ReportType::Insights, Some("U1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.report_id, newest.report_id);
        assert_eq!(latest.payload, json!({"v": 3}));
    }

    #[tokio::test]
    async fn test_platform_wide_owner_is_exact_none_match() {
        let ledger = make_ledger();
        ledger
            .append(ReportType::Trends, None, json!({"trend": "a"}))
            .await
            .unwrap();

        let latest = ledger.latest(ReportType::Trends, None).await.unwrap();
        assert!(latest.is_some());
        assert_eq!(latest.unwrap().owner_id, None);
    }

    #[tokio::test]
    async fn test_append_grows_history_without_mutation() {
        let ledger = make_ledger();
        let first = ledger
            .append(ReportType::Funding, Some("U1"), json!({"round": 1}))
            .await
            .unwrap();
        ledger
            .append(ReportType::Funding, Some("U1"), json!({"round": 2}))
            .await
            .unwrap();

        let history = ledger.history(ReportType::Funding, Some("U1")).await.unwrap();
        assert_eq!(history.len(), 2);
        // The earlier record is still present and untouched.
        assert_eq!(history[0].report_id, first.report_id);
        assert_eq!(history[0].payload, json!({"round": 1}));
    }

    #[tokio::test]
    async fn test_history_is_oldest_first() {
        let ledger = make_ledger();
        seed_report(
            &ledger,
            ReportType::Insights,
            Some("U1"),
            json!({"v": "old"}),
            ChronoDuration::hours(10),
        )
        .await;
        seed_report(
            &ledger,
            ReportType::Insights,
            Some("U1"),
            json!({"v": "new"}),
            ChronoDuration::hours(2),
        )
        .await;

        let history = ledger.history(ReportType::Insights, Some("U1")).await.unwrap();
        assert_eq!(history[0].payload, json!({"v": "old"}));
        assert_eq!(history[1].payload, json!({"v": "new"}));
    }

    #[tokio::test]
    async fn test_types_do_not_cross_select() {
        let ledger = make_ledger();
        ledger
            .append(ReportType::Funding, Some("U1"), json!({"kind": "funding"}))
            .await
            .unwrap();

        let latest = ledger.latest(ReportType::Insights, Some("U1")).await.unwrap();
        assert!(latest.is_none());
    }
}
