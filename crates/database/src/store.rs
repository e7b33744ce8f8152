//! [`DocumentStore`] implementation backed by SQLite.

use futures::stream::{self, StreamExt};
use rakto_core::{async_trait, Collection, Document, DocumentStore, DocumentStream, Fields, Query};
use tracing::debug;

use crate::documents;
use crate::Database;

#[async_trait]
impl DocumentStore for Database {
    async fn run_query(&self, query: &Query) -> rakto_core::Result<DocumentStream> {
        let documents = documents::query_documents(self.pool(), query).await?;
        debug!(
            "Query on {} with {} filter(s) matched {} document(s)",
            query.collection,
            query.filters.len(),
            documents.len()
        );
        Ok(stream::iter(documents.into_iter().map(Ok)).boxed())
    }

    async fn get(&self, collection: Collection, id: &str) -> rakto_core::Result<Option<Document>> {
        Ok(documents::get_document(self.pool(), collection, id).await?)
    }

    async fn create(&self, collection: Collection, fields: Fields) -> rakto_core::Result<Document> {
        let document = documents::insert_document(self.pool(), collection, &fields).await?;
        debug!("Created {} document {}", collection, document.id);
        Ok(document)
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> rakto_core::Result<Document> {
        let document = documents::upsert_document(self.pool(), collection, id, &fields).await?;
        debug!("Set {} document {}", collection, id);
        Ok(document)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Fields,
    ) -> rakto_core::Result<Document> {
        let keys: Vec<String> = patch.keys().cloned().collect();
        let document = documents::update_document(self.pool(), collection, id, patch).await?;
        debug!("Updated {} document {} fields {:?}", collection, id, keys);
        Ok(document)
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
