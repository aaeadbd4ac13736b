// In-memory document store - the primary test backend, also usable for
// ephemeral walls. BTreeMap keeps id iteration order stable so unordered
// queries are deterministic.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::storage::{sort_and_limit, DocumentQuery, DocumentStore};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held by a collection.
    pub async fn collection_len(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, document: Value) -> AppResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|c| c.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn query(&self, collection: &str, query: DocumentQuery) -> AppResult<Vec<Value>> {
        let collections = self.collections.read().await;
        let matched = collections
            .get(collection)
            .map(|c| {
                c.values()
                    .filter(|doc| query.matches(doc))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(sort_and_limit(matched, &query))
    }
}
