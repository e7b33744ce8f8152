//! Device-local key/value storage and the cached profile snapshot.

use rakto_core::{async_trait, BackendError, ProfileCache, UserProfile, PROFILE_CACHE_KEY};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::Database;

/// Get a stored value.
pub async fn get_item(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value = sqlx::query_scalar::<_, String>(
        r#"
        SELECT value FROM local_storage WHERE key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(value)
}

/// Store a value, replacing any previous one.
pub async fn set_item(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO local_storage (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = datetime('now')
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a value.
///
/// Returns true if a value was removed, false if none existed.
pub async fn remove_item(pool: &SqlitePool, key: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM local_storage WHERE key = ?
        "#,
    )
    .bind(key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// [`ProfileCache`] stored under [`PROFILE_CACHE_KEY`] in `local_storage`.
#[derive(Debug, Clone)]
pub struct LocalProfileCache {
    database: Database,
}

impl LocalProfileCache {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl ProfileCache for LocalProfileCache {
    async fn store(&self, profile: &UserProfile) -> rakto_core::Result<()> {
        let json = serde_json::to_string(profile).map_err(BackendError::Encode)?;
        set_item(self.database.pool(), PROFILE_CACHE_KEY, &json).await?;
        Ok(())
    }

    async fn load(&self) -> rakto_core::Result<Option<UserProfile>> {
        let Some(json) = get_item(self.database.pool(), PROFILE_CACHE_KEY).await? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| BackendError::Decode {
                collection: "local_storage",
                id: PROFILE_CACHE_KEY.to_string(),
                source,
            })
    }

    async fn clear(&self) -> rakto_core::Result<()> {
        remove_item(self.database.pool(), PROFILE_CACHE_KEY).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn profile() -> UserProfile {
        UserProfile {
            uid: "uid-1".to_string(),
            phone_number: "+8801712345678".to_string(),
            display_name: Some("Karim".to_string()),
            email: None,
            photo_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_item_roundtrip_and_remove() {
        let db = test_db().await;

        assert!(get_item(db.pool(), "k").await.unwrap().is_none());
        set_item(db.pool(), "k", "one").await.unwrap();
        set_item(db.pool(), "k", "two").await.unwrap();
        assert_eq!(get_item(db.pool(), "k").await.unwrap(), Some("two".to_string()));

        assert!(remove_item(db.pool(), "k").await.unwrap());
        assert!(!remove_item(db.pool(), "k").await.unwrap());
    }

    #[tokio::test]
    async fn test_profile_cache() {
        let cache = LocalProfileCache::new(test_db().await);

        assert!(cache.load().await.unwrap().is_none());

        cache.store(&profile()).await.unwrap();
        assert_eq!(cache.load().await.unwrap(), Some(profile()));

        cache.clear().await.unwrap();
        assert!(cache.load().await.unwrap().is_none());

        // Clearing twice is fine
        cache.clear().await.unwrap();
    }
}
