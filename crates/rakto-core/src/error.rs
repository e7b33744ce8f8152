//! Error types for backend operations.

use thiserror::Error;

/// Errors that can occur when talking to the backend.
///
/// Messages are surfaced verbatim to the user; there is no retryable/fatal
/// classification.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached or is not ready.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The addressed document does not exist.
    #[error("{collection} document not found: {id}")]
    NotFound { collection: &'static str, id: String },

    /// Authentication failed (bad code, expired handle, signed out).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A stored document could not be mapped into a typed record.
    #[error("could not decode {collection} document {id}: {source}")]
    Decode {
        collection: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be encoded into document fields.
    #[error("could not encode document: {0}")]
    Encode(#[source] serde_json::Error),

    /// Storage layer failure (database, local cache).
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
