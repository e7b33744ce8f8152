//! Delayed store implementation - wraps another store with artificial latency.

use std::time::Duration;

use rakto_core::{
    async_trait, Collection, Document, DocumentStore, DocumentStream, Fields, Query,
};
use tokio::time::sleep;

/// A store that wraps another store and delays every call.
///
/// Useful for interleaving concurrent requests in tests.
#[derive(Debug)]
pub struct DelayedStore<S: DocumentStore> {
    inner: S,
    delay: Duration,
}

impl<S: DocumentStore> DelayedStore<S> {
    /// Create a new DelayedStore wrapping the given store with the specified delay.
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a store with a delay in milliseconds.
    pub fn with_millis(inner: S, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Get a reference to the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for DelayedStore<S> {
    async fn run_query(&self, query: &Query) -> rakto_core::Result<DocumentStream> {
        sleep(self.delay).await;
        self.inner.run_query(query).await
    }

    async fn get(&self, collection: Collection, id: &str) -> rakto_core::Result<Option<Document>> {
        sleep(self.delay).await;
        self.inner.get(collection, id).await
    }

    async fn create(&self, collection: Collection, fields: Fields) -> rakto_core::Result<Document> {
        sleep(self.delay).await;
        self.inner.create(collection, fields).await
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> rakto_core::Result<Document> {
        sleep(self.delay).await;
        self.inner.set(collection, id, fields).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Fields,
    ) -> rakto_core::Result<Document> {
        sleep(self.delay).await;
        self.inner.update(collection, id, patch).await
    }

    fn name(&self) -> &str {
        "DelayedStore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delayed_store() {
        let store = DelayedStore::with_millis(MemoryStore::new(), 50);

        let start = Instant::now();
        store.create(Collection::Donors, Fields::new()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(store.inner().write_count(), 1);
    }

    #[tokio::test]
    async fn test_store_name() {
        let store = DelayedStore::with_millis(MemoryStore::new(), 0);
        assert_eq!(store.name(), "DelayedStore");
    }
}
