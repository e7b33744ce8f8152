//! In-memory backend implementations for testing the RaktoConnect client.
//!
//! This crate provides mock implementations of the backend traits:
//! - `MemoryStore` - In-memory [`DocumentStore`] with strictly increasing timestamps
//! - `MockAuth` - Phone authentication accepting a fixed code
//! - `MemoryProfileCache` - In-memory [`ProfileCache`]
//! - `FailingStore` - Wraps another store and fails reads or writes on demand
//! - `DelayedStore` - Wraps another store with artificial delay
//!
//! For a persistent store, use the `database` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_backend::{AuthProvider, MockAuth, DEFAULT_CODE};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_backend::BackendError> {
//!     let auth = MockAuth::new();
//!
//!     let handle = auth.send_verification_code("+8801712345678").await?;
//!     let identity = auth.verify_code(&handle, DEFAULT_CODE).await?;
//!     println!("Signed in as {}", identity.uid);
//!     Ok(())
//! }
//! ```

mod auth;
mod cache;
mod delayed;
mod failing;
mod memory;

// Re-export rakto-core types for convenience
pub use rakto_core::{
    async_trait, AuthProvider, BackendError, DocumentStore, ProfileCache,
};

pub use auth::{MockAuth, DEFAULT_CODE};
pub use cache::MemoryProfileCache;
pub use delayed::DelayedStore;
pub use failing::FailingStore;
pub use memory::MemoryStore;
