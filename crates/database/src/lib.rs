//! SQLite persistence layer for RaktoConnect.
//!
//! This crate provides a [`rakto_core::DocumentStore`] over SQLite using SQLx.
//! Each collection is a set of JSON documents; composed queries become
//! `json_extract` predicates ordered by creation time. It also holds the
//! device-local profile cache and the form-field validators.
//!
//! # Example
//!
//! ```no_run
//! use database::Database;
//! use rakto_core::{BloodGroup, DocumentStore, DonorFilter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:rakto.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Find O- donors in Dhaka
//!     let query = DonorFilter::new()
//!         .blood_group(BloodGroup::ONegative)
//!         .city("Dhaka")
//!         .build_query();
//!     let _results = db.run_query(&query).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod documents;
pub mod error;
pub mod local_storage;
pub mod models;
pub mod store;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use local_storage::LocalProfileCache;
pub use models::DocumentRow;
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    pub const DEFAULT_POOL_SIZE: u32 = 5;

    /// How long a writer waits for a competing write lock before failing.
    pub const BUSY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/rakto.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(Self::BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rakto_core::Collection;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db.migrate().await.unwrap();

        let count = documents::count_documents(db.pool(), Collection::Donors)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
