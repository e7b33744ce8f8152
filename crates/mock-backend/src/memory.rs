//! In-memory document store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use rakto_core::{
    async_trait, BackendError, Collection, Document, DocumentStore, DocumentStream, Fields, Query,
};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Inner {
    /// Documents per collection, in insertion order.
    collections: HashMap<Collection, IndexMap<String, Document>>,
    /// Last timestamp handed out; keeps server time strictly increasing.
    last_timestamp: Option<DateTime<Utc>>,
}

impl Inner {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn collection(&mut self, collection: Collection) -> &mut IndexMap<String, Document> {
        self.collections.entry(collection).or_default()
    }
}

/// A [`DocumentStore`] that keeps every collection in memory.
///
/// Server timestamps are strictly increasing, so documents created in
/// sequence always sort newest first. Read and write counters let tests
/// assert that no request was sent.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document exactly as given, bypassing server timestamps.
    ///
    /// Useful for seeding documents with specific or missing timestamps.
    pub async fn insert_raw(&self, collection: Collection, document: Document) {
        let mut inner = self.inner.write().await;
        inner
            .collection(collection)
            .insert(document.id.clone(), document);
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: Collection) -> usize {
        let inner = self.inner.read().await;
        inner.collections.get(&collection).map_or(0, IndexMap::len)
    }

    /// Number of read calls (`run_query`, `get`) served.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write calls (`create`, `set`, `update`) served.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn run_query(&self, query: &Query) -> rakto_core::Result<DocumentStream> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read().await;

        // Newest-inserted first, so equal timestamps resolve like the SQLite store.
        let candidates: Vec<Document> = inner
            .collections
            .get(&query.collection)
            .map(|docs| docs.values().rev().cloned().collect())
            .unwrap_or_default();

        let results = query.apply(candidates);
        Ok(stream::iter(results.into_iter().map(Ok)).boxed())
    }

    async fn get(&self, collection: Collection, id: &str) -> rakto_core::Result<Option<Document>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.read().await;
        Ok(inner
            .collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn create(&self, collection: Collection, fields: Fields) -> rakto_core::Result<Document> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.write().await;
        let now = inner.next_timestamp();

        let document = Document::new(Uuid::new_v4().simple().to_string(), fields)
            .with_timestamps(Some(now), Some(now));
        inner
            .collection(collection)
            .insert(document.id.clone(), document.clone());
        Ok(document)
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> rakto_core::Result<Document> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.write().await;
        let now = inner.next_timestamp();
        let docs = inner.collection(collection);

        let created_at = docs.get(id).and_then(|d| d.created_at).unwrap_or(now);
        let document = Document::new(id, fields).with_timestamps(Some(created_at), Some(now));
        docs.insert(id.to_string(), document.clone());
        Ok(document)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Fields,
    ) -> rakto_core::Result<Document> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.write().await;
        let now = inner.next_timestamp();

        let document = inner
            .collection(collection)
            .get_mut(id)
            .ok_or_else(|| BackendError::NotFound {
                collection: collection.name(),
                id: id.to_string(),
            })?;
        document.merge(patch);
        document.updated_at = Some(now);
        Ok(document.clone())
    }

    fn name(&self) -> &str {
        "MemoryStore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use rakto_core::{BloodGroup, DonorFilter};
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    async fn ids(store: &MemoryStore, query: &Query) -> Vec<String> {
        store
            .run_query(query)
            .await
            .unwrap()
            .map_ok(|doc| doc.id)
            .try_collect()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_timestamps_strictly_increase() {
        let store = MemoryStore::new();
        let a = store.create(Collection::Donors, Fields::new()).await.unwrap();
        let b = store.create(Collection::Donors, Fields::new()).await.unwrap();
        assert!(b.created_at > a.created_at);
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let store = MemoryStore::new();
        let old = store
            .create(Collection::Donors, fields(json!({ "bloodGroup": "O-", "city": "Dhaka" })))
            .await
            .unwrap();
        store
            .create(Collection::Donors, fields(json!({ "bloodGroup": "O-", "city": "Khulna" })))
            .await
            .unwrap();
        let new = store
            .create(Collection::Donors, fields(json!({ "bloodGroup": "O-", "city": "Dhaka" })))
            .await
            .unwrap();

        let query = DonorFilter::new()
            .blood_group(BloodGroup::ONegative)
            .city("Dhaka")
            .build_query();
        assert_eq!(ids(&store, &query).await, vec![new.id, old.id]);
        assert_eq!(store.read_count(), 1);
        assert_eq!(store.write_count(), 3);
    }

    #[tokio::test]
    async fn test_raw_documents_without_timestamps_sort_last() {
        let store = MemoryStore::new();
        store
            .insert_raw(Collection::Donors, Document::new("legacy", Fields::new()))
            .await;
        let dated = store.create(Collection::Donors, Fields::new()).await.unwrap();

        let query = DonorFilter::new().build_query();
        assert_eq!(ids(&store, &query).await, vec![dated.id, "legacy".to_string()]);
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = MemoryStore::new();
        let err = store
            .update(Collection::BloodRequests, "missing", Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_set_preserves_created_at() {
        let store = MemoryStore::new();
        let first = store.set(Collection::Users, "uid", Fields::new()).await.unwrap();
        let second = store.set(Collection::Users, "uid", Fields::new()).await.unwrap();
        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(store.len(Collection::Users).await, 1);
    }
}
