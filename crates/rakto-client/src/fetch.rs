//! Decoding query results into typed records.

use futures::future;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use rakto_core::{BackendError, DocumentStore, Query, Record};

/// Lazy sequence of typed records.
pub type RecordStream<T> = BoxStream<'static, Result<T, BackendError>>;

/// Run `query` and decode each document as it arrives.
pub(crate) async fn stream_records<T>(
    store: &dyn DocumentStore,
    query: &Query,
) -> Result<RecordStream<T>, BackendError>
where
    T: Record + Send + 'static,
{
    let documents = store.run_query(query).await?;
    Ok(documents
        .and_then(|document| future::ready(T::from_document(document)))
        .boxed())
}

/// Run `query` and decode every result. Fails on the first bad document.
pub(crate) async fn fetch_records<T>(
    store: &dyn DocumentStore,
    query: &Query,
) -> Result<Vec<T>, BackendError>
where
    T: Record + Send + 'static,
{
    stream_records(store, query).await?.try_collect().await
}
