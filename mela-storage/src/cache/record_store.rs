//! Typed record layer over the raw key-value boundary.
//!
//! Serializes [`CacheRecord`] / [`ReportRecord`] to JSON documents and
//! derives their storage keys. Each enrichment kind gets its own
//! collection, so call sites cannot interfere with each other's records.

use std::sync::Arc;

use mela_core::{
    CacheKey, CacheRecord, EnrichmentKind, MelaResult, ReportRecord, ReportType, StoreError,
};

use crate::KeyValueStore;

/// Ledger key segment used when a report has no owner.
const PLATFORM_OWNER: &str = "_platform";

/// Typed adapter between engine records and the document store.
pub struct RecordStore<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> RecordStore<S> {
    /// Wrap a key-value store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The underlying store, for callers that need unconditional raw
    /// reads (e.g. serving stale data after an upstream failure).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the cache record for a key, if any.
    pub async fn cache_get(
        &self,
        kind: EnrichmentKind,
        key: &CacheKey,
    ) -> MelaResult<Option<CacheRecord>> {
        let Some(doc) = self.store.get(kind.collection(), key.as_str()).await? else {
            return Ok(None);
        };
        let record = serde_json::from_value(doc).map_err(|e| StoreError::CorruptRecord {
            collection: kind.collection().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(record))
    }

    /// Upsert a cache record under its own key (last write wins).
    pub async fn cache_put(&self, kind: EnrichmentKind, record: &CacheRecord) -> MelaResult<()> {
        let doc = serde_json::to_value(record).map_err(|e| StoreError::CorruptRecord {
            collection: kind.collection().to_string(),
            reason: e.to_string(),
        })?;
        self.store
            .set(kind.collection(), record.key.as_str(), doc)
            .await
    }

    /// Append one report record. Every record gets a distinct key, so
    /// appends never overwrite prior history.
    pub async fn ledger_append(&self, record: &ReportRecord) -> MelaResult<()> {
        let collection = EnrichmentKind::Reports.collection();
        let doc = serde_json::to_value(record).map_err(|e| StoreError::CorruptRecord {
            collection: collection.to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(collection, &ledger_key(record), doc).await
    }

    /// List every report record for an exact `(type, owner)` pair.
    pub async fn ledger_list(
        &self,
        report_type: ReportType,
        owner_id: Option<&str>,
    ) -> MelaResult<Vec<ReportRecord>> {
        let collection = EnrichmentKind::Reports.collection();
        let docs = self
            .store
            .list_prefix(collection, &ledger_prefix(report_type, owner_id))
            .await?;
        docs.into_iter()
            .map(|doc| {
                serde_json::from_value(doc).map_err(|e| {
                    StoreError::CorruptRecord {
                        collection: collection.to_string(),
                        reason: e.to_string(),
                    }
                    .into()
                })
            })
            .collect()
    }
}

impl<S: KeyValueStore> Clone for RecordStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

/// `{type}/{owner}/` - the trailing slash keeps owner matching exact
/// ("U1" must never pick up "U12" records).
fn ledger_prefix(report_type: ReportType, owner_id: Option<&str>) -> String {
    format!(
        "{}/{}/",
        report_type.slug(),
        owner_id.unwrap_or(PLATFORM_OWNER)
    )
}

fn ledger_key(record: &ReportRecord) -> String {
    format!(
        "{}{}",
        ledger_prefix(record.report_type, record.owner_id.as_deref()),
        record.report_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use serde_json::json;

    fn make_store() -> RecordStore<MemoryStore> {
        RecordStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_cache_record_roundtrip() {
        let records = make_store();
        let key = CacheKey::for_query("block print fabric").unwrap();
        let record = CacheRecord::new(key.clone(), vec![json!({"supplier": "a"})]);

        records
            .cache_put(EnrichmentKind::RawMaterials, &record)
            .await
            .unwrap();
        let back = records
            .cache_get(EnrichmentKind::RawMaterials, &key)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(back.key, key);
        assert_eq!(back.payload, record.payload);
    }

    #[tokio::test]
    async fn test_cache_get_missing_is_none() {
        let records = make_store();
        let key = CacheKey::for_query("nothing here").unwrap();
        let record = records
            .cache_get(EnrichmentKind::RawMaterials, &key)
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("raw_materials", "broken", json!("not a record"))
            .await
            .unwrap();

        let records = RecordStore::new(store);
        let key = CacheKey::for_query("broken").unwrap();
        let err = records
            .cache_get(EnrichmentKind::RawMaterials, &key)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            mela_core::MelaError::Store(StoreError::CorruptRecord { .. })
        ));
    }

    #[tokio::test]
    async fn test_ledger_owner_matching_is_exact() {
        let records = make_store();
        let u1 = ReportRecord::new(ReportType::Insights, Some("U1".into()), json!({"v": 1}));
        let u12 = ReportRecord::new(ReportType::Insights, Some("U12".into()), json!({"v": 2}));
        records.ledger_append(&u1).await.unwrap();
        records.ledger_append(&u12).await.unwrap();

        let listed = records
            .ledger_list(ReportType::Insights, Some("U1"))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].report_id, u1.report_id);
    }

    #[tokio::test]
    async fn test_ledger_platform_reports_have_their_own_namespace() {
        let records = make_store();
        let platform = ReportRecord::new(ReportType::Trends, None, json!({"v": 1}));
        let owned = ReportRecord::new(ReportType::Funding, Some("U1".into()), json!({"v": 2}));
        records.ledger_append(&platform).await.unwrap();
        records.ledger_append(&owned).await.unwrap();

        let listed = records.ledger_list(ReportType::Trends, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].owner_id, None);
    }

    #[tokio::test]
    async fn test_ledger_append_never_overwrites() {
        let records = make_store();
        for version in 0..3 {
            let record =
                ReportRecord::new(ReportType::Funding, Some("U1".into()), json!({"v": version}));
            records.ledger_append(&record).await.unwrap();
        }
        let listed = records
            .ledger_list(ReportType::Funding, Some("U1"))
            .await
            .unwrap();
        assert_eq!(listed.len(), 3);
    }
}
