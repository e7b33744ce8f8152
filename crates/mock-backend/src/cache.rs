//! In-memory profile cache.

use std::sync::atomic::{AtomicBool, Ordering};

use rakto_core::{async_trait, BackendError, ProfileCache, UserProfile};
use tokio::sync::Mutex;

/// A [`ProfileCache`] holding the snapshot in memory.
///
/// Can be switched into a failing mode to exercise the advisory-cache path.
#[derive(Debug, Default)]
pub struct MemoryProfileCache {
    snapshot: Mutex<Option<UserProfile>>,
    failing: AtomicBool,
}

impl MemoryProfileCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that already holds a snapshot from a previous launch.
    pub fn with_snapshot(profile: UserProfile) -> Self {
        Self {
            snapshot: Mutex::new(Some(profile)),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Peek at the stored snapshot without going through the trait.
    pub async fn snapshot(&self) -> Option<UserProfile> {
        self.snapshot.lock().await.clone()
    }

    fn check(&self) -> rakto_core::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Storage("local storage unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileCache for MemoryProfileCache {
    async fn store(&self, profile: &UserProfile) -> rakto_core::Result<()> {
        self.check()?;
        *self.snapshot.lock().await = Some(profile.clone());
        Ok(())
    }

    async fn load(&self) -> rakto_core::Result<Option<UserProfile>> {
        self.check()?;
        Ok(self.snapshot.lock().await.clone())
    }

    async fn clear(&self) -> rakto_core::Result<()> {
        self.check()?;
        *self.snapshot.lock().await = None;
        Ok(())
    }
}
