//! MELA Storage - Document-Store Boundary and Cache Engine
//!
//! Defines the key-value abstraction the marketplace document store must
//! implement, an in-memory implementation for tests and development, and
//! the temporal cache engine built on top of it. The engine performs no
//! buffering, no retries, and no write-behind: a store failure is fatal to
//! the call and propagates unchanged.

pub mod cache;

pub use cache::{
    resolve_with_cascade, RecordStore, RefreshMode, ReportLedger, ScopeFetcher, TemporalCache,
};

use async_trait::async_trait;
use mela_core::MelaResult;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Minimal persistent key→document map.
///
/// The cache engine needs nothing beyond point lookups, last-write-wins
/// upserts, and prefix listings, all keyed by string within a named
/// collection. The production implementation wraps the marketplace's
/// document store; [`MemoryStore`] ships for tests and development.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a document by key. Absent keys are `Ok(None)`, not an error.
    async fn get(&self, collection: &str, key: &str) -> MelaResult<Option<Value>>;

    /// Upsert a document. Creates the key if absent, overwrites in place
    /// if present (last write wins).
    async fn set(&self, collection: &str, key: &str, document: Value) -> MelaResult<()>;

    /// List all documents whose key starts with `prefix`, in key order.
    async fn list_prefix(&self, collection: &str, prefix: &str) -> MelaResult<Vec<Value>>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// In-memory [`KeyValueStore`] for tests and development.
///
/// Collections are created lazily on first write. Keys within a collection
/// are kept sorted so prefix listings come back in key order, matching the
/// document store's index behavior.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn document_count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map(BTreeMap::len).unwrap_or(0)
    }

    /// Remove all documents from all collections.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> MelaResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    async fn set(&self, collection: &str, key: &str, document: Value) -> MelaResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), document);
        Ok(())
    }

    async fn list_prefix(&self, collection: &str, prefix: &str) -> MelaResult<Vec<Value>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}

/// A store wrapper that fails every operation, for exercising the
/// store-unavailable path in tests.
#[cfg(test)]
pub(crate) struct FailingStore;

#[cfg(test)]
use mela_core::StoreError;

#[cfg(test)]
#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _collection: &str, _key: &str) -> MelaResult<Option<Value>> {
        Err(StoreError::Unavailable {
            reason: "connection refused".to_string(),
        }
        .into())
    }

    async fn set(&self, _collection: &str, _key: &str, _document: Value) -> MelaResult<()> {
        Err(StoreError::Unavailable {
            reason: "connection refused".to_string(),
        }
        .into())
    }

    async fn list_prefix(&self, _collection: &str, _prefix: &str) -> MelaResult<Vec<Value>> {
        Err(StoreError::Unavailable {
            reason: "connection refused".to_string(),
        }
        .into())
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: the latest write for a key is the one returned.
        #[test]
        fn prop_last_write_wins(key in "[a-z_]{1,12}", first in 0i64..1000, second in 0i64..1000) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = MemoryStore::new();
                store.set("c", &key, json!(first)).await.unwrap();
                store.set("c", &key, json!(second)).await.unwrap();
                prop_assert_eq!(store.get("c", &key).await.unwrap(), Some(json!(second)));
                Ok(())
            })?;
        }

        /// Property: list_prefix returns exactly the documents whose keys
        /// carry the prefix.
        #[test]
        fn prop_list_prefix_exact(keys in proptest::collection::btree_set("[a-c]{1,4}", 1..8), prefix in "[a-c]{0,2}") {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = MemoryStore::new();
                for key in &keys {
                    store.set("c", key, json!(key)).await.unwrap();
                }
                let listed = store.list_prefix("c", &prefix).await.unwrap();
                let expected: Vec<_> = keys
                    .iter()
                    .filter(|k| k.starts_with(&prefix))
                    .map(|k| json!(k))
                    .collect();
                prop_assert_eq!(listed, expected);
                Ok(())
            })?;
        }
    }
}
