//! Store wrapper that fails on demand.

use std::sync::atomic::{AtomicBool, Ordering};

use rakto_core::{
    async_trait, BackendError, Collection, Document, DocumentStore, DocumentStream, Fields, Query,
};

/// Wraps another store and fails reads and/or writes while switched on.
///
/// Useful for testing rollback and error surfacing without a real outage.
#[derive(Debug)]
pub struct FailingStore<S: DocumentStore> {
    inner: S,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl<S: DocumentStore> FailingStore<S> {
    /// Wrap a store; nothing fails until switched on.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Fail `run_query` and `get`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Fail `create`, `set`, and `update`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Get a reference to the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self, flag: &AtomicBool) -> rakto_core::Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable(
                "network request failed".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for FailingStore<S> {
    async fn run_query(&self, query: &Query) -> rakto_core::Result<DocumentStream> {
        self.check(&self.fail_reads)?;
        self.inner.run_query(query).await
    }

    async fn get(&self, collection: Collection, id: &str) -> rakto_core::Result<Option<Document>> {
        self.check(&self.fail_reads)?;
        self.inner.get(collection, id).await
    }

    async fn create(&self, collection: Collection, fields: Fields) -> rakto_core::Result<Document> {
        self.check(&self.fail_writes)?;
        self.inner.create(collection, fields).await
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> rakto_core::Result<Document> {
        self.check(&self.fail_writes)?;
        self.inner.set(collection, id, fields).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Fields,
    ) -> rakto_core::Result<Document> {
        self.check(&self.fail_writes)?;
        self.inner.update(collection, id, patch).await
    }

    fn name(&self) -> &str {
        "FailingStore"
    }
}
