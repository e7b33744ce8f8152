//! Backend storage traits.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::document::{Document, Fields};
use crate::error::Result;
use crate::query::Query;
use crate::records::UserProfile;
use crate::types::Collection;

/// Lazy sequence of query results.
pub type DocumentStream = BoxStream<'static, Result<Document>>;

/// Storage key of the cached user-profile snapshot.
pub const PROFILE_CACHE_KEY: &str = "userProfile";

/// A document database holding the `users`, `donors`, and `bloodRequests`
/// collections.
///
/// Implementations assign `created_at` on create and `updated_at` on every
/// write. This trait is object-safe and can be used with `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a composed query.
    async fn run_query(&self, query: &Query) -> Result<DocumentStream>;

    /// Fetch a document by key. `Ok(None)` when it does not exist.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>>;

    /// Create a document under a store-generated key.
    async fn create(&self, collection: Collection, fields: Fields) -> Result<Document>;

    /// Create or replace the document under `id`.
    ///
    /// Replacing keeps the original `created_at`.
    async fn set(&self, collection: Collection, id: &str, fields: Fields) -> Result<Document>;

    /// Merge `patch` into an existing document.
    ///
    /// Fails with [`crate::BackendError::NotFound`] when the document is missing.
    async fn update(&self, collection: Collection, id: &str, patch: Fields) -> Result<Document>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// Device-local cache of the last-known user profile.
///
/// Advisory only: the live auth callback always supersedes it.
#[async_trait]
pub trait ProfileCache: Send + Sync {
    /// Replace the cached snapshot.
    async fn store(&self, profile: &UserProfile) -> Result<()>;

    /// Read the cached snapshot, if any.
    async fn load(&self) -> Result<Option<UserProfile>>;

    /// Remove the cached snapshot. Clearing an empty cache is not an error.
    async fn clear(&self) -> Result<()>;
}
