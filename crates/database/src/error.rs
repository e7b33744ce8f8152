//! Database error types.

use rakto_core::BackendError;
use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored document body is not a JSON object
    #[error("corrupt document body: {0}")]
    Json(#[from] serde_json::Error),

    /// Record not found
    #[error("{collection} document not found: {id}")]
    NotFound { collection: &'static str, id: String },
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;

impl From<DatabaseError> for BackendError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound { collection, id } => BackendError::NotFound { collection, id },
            DatabaseError::Sqlx(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_),
            ) => BackendError::Unavailable(e.to_string()),
            other => BackendError::Storage(other.to_string()),
        }
    }
}
