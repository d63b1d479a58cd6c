//! Async document-store abstraction backing the aggregate stats.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::sync::Mutex;

/// Document store operation error.
///
/// Infrastructure failures only; domain decisions (what to aggregate, what
/// to skip) live in the callers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("transaction failed: {0}")]
    Transaction(String),

    #[error("failed to encode document for '{collection}': {message}")]
    Encode { collection: String, message: String },
}

/// Closure applied atomically against the current version of a document.
pub type UpdateFn = Box<dyn FnOnce(Option<JsonValue>) -> JsonValue + Send>;

/// Minimal async surface of the backing document store.
///
/// `transactional_update` is the store's transactional primitive:
/// read-current-then-write as one atomic step, so racing writers cannot lose
/// each other's updates mid-merge.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_all(&self, collection: &str) -> Result<Vec<JsonValue>, StoreError>;

    /// Equality filter over top-level document fields.
    async fn query(
        &self,
        collection: &str,
        filter: &JsonValue,
    ) -> Result<Vec<JsonValue>, StoreError>;

    async fn get_by_id(&self, collection: &str, id: &str)
    -> Result<Option<JsonValue>, StoreError>;

    async fn put(&self, collection: &str, id: &str, document: JsonValue)
    -> Result<(), StoreError>;

    async fn transactional_update(
        &self,
        collection: &str,
        id: &str,
        update: UpdateFn,
    ) -> Result<JsonValue, StoreError>;
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn get_all(&self, collection: &str) -> Result<Vec<JsonValue>, StoreError> {
        (**self).get_all(collection).await
    }

    async fn query(
        &self,
        collection: &str,
        filter: &JsonValue,
    ) -> Result<Vec<JsonValue>, StoreError> {
        (**self).query(collection, filter).await
    }

    async fn get_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<JsonValue>, StoreError> {
        (**self).get_by_id(collection, id).await
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        document: JsonValue,
    ) -> Result<(), StoreError> {
        (**self).put(collection, id, document).await
    }

    async fn transactional_update(
        &self,
        collection: &str,
        id: &str,
        update: UpdateFn,
    ) -> Result<JsonValue, StoreError> {
        (**self).transactional_update(collection, id, update).await
    }
}

/// In-memory document store for tests/dev.
///
/// A single async mutex over the whole keyspace; `transactional_update`
/// applies its closure under the lock, which is the whole transactional
/// story an in-memory store needs.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<BTreeMap<(String, String), JsonValue>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(document: &JsonValue, filter: &JsonValue) -> bool {
    let Some(conditions) = filter.as_object() else {
        return true;
    };
    conditions
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<JsonValue>, StoreError> {
        let documents = self.documents.lock().await;
        Ok(documents
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn query(
        &self,
        collection: &str,
        filter: &JsonValue,
    ) -> Result<Vec<JsonValue>, StoreError> {
        let documents = self.documents.lock().await;
        Ok(documents
            .iter()
            .filter(|((c, _), doc)| c == collection && matches_filter(doc, filter))
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn get_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<JsonValue>, StoreError> {
        let documents = self.documents.lock().await;
        Ok(documents
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        document: JsonValue,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.lock().await;
        documents.insert((collection.to_string(), id.to_string()), document);
        Ok(())
    }

    async fn transactional_update(
        &self,
        collection: &str,
        id: &str,
        update: UpdateFn,
    ) -> Result<JsonValue, StoreError> {
        let mut documents = self.documents.lock().await;
        let key = (collection.to_string(), id.to_string());
        let current = documents.get(&key).cloned();
        let next = update(current);
        documents.insert(key, next.clone());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn query_filters_on_top_level_fields() {
        let store = InMemoryDocumentStore::new();
        store
            .put("obligations", "a", json!({ "active": true, "kind": "income" }))
            .await
            .unwrap();
        store
            .put("obligations", "b", json!({ "active": false, "kind": "income" }))
            .await
            .unwrap();

        let active = store
            .query("obligations", &json!({ "active": true }))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0]["kind"], "income");
    }

    #[tokio::test]
    async fn transactional_update_sees_the_current_document() {
        let store = InMemoryDocumentStore::new();
        store.put("stats", "aggregate", json!({ "total": 1 })).await.unwrap();

        let updated = store
            .transactional_update(
                "stats",
                "aggregate",
                Box::new(|current| {
                    let total = current
                        .as_ref()
                        .and_then(|doc| doc["total"].as_i64())
                        .unwrap_or(0);
                    json!({ "total": total + 1 })
                }),
            )
            .await
            .unwrap();

        assert_eq!(updated["total"], 2);
        let stored = store.get_by_id("stats", "aggregate").await.unwrap().unwrap();
        assert_eq!(stored["total"], 2);
    }

    #[tokio::test]
    async fn transactional_update_creates_missing_documents() {
        let store = InMemoryDocumentStore::new();
        let created = store
            .transactional_update(
                "stats",
                "aggregate",
                Box::new(|current| {
                    assert!(current.is_none());
                    json!({ "total": 0 })
                }),
            )
            .await
            .unwrap();

        assert_eq!(created["total"], 0);
    }
}
