//! Key-Value Session Store
//!
//! Redis-like storage abstraction with per-key atomic get/set and no
//! multi-key transactions. Writes are unconditional overwrites; a race
//! between two writers for the same key is resolved by whichever write
//! lands last in the backing store.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::RwLock;

/// Store backend errors
///
/// Connectivity failures only; a missing key is not an error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Trait for key-value session store backends
///
/// Each operation is atomic per key. Entries may carry a TTL, but callers
/// must not rely on expiry for correctness.
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// Read the value at `key`, if present and not expired
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Unconditionally overwrite the value at `key` (last write wins)
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Remove the value at `key` (no-op when absent)
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================================================
// In-memory backend
// ============================================================================

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory session store
///
/// Single-process backend for development and tests. Expired entries are
/// dropped lazily on read and swept on write.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

// ============================================================================
// Redis backend (feature-gated)
// ============================================================================

#[cfg(feature = "redis")]
mod redis_store {
    use super::{SessionStore, StoreError};
    use redis::AsyncCommands;
    use std::time::Duration;

    impl From<redis::RedisError> for StoreError {
        fn from(err: redis::RedisError) -> Self {
            StoreError::Unavailable(err.to_string())
        }
    }

    /// Redis-backed session store
    ///
    /// Uses a `ConnectionManager` so clones share one multiplexed connection.
    #[derive(Clone)]
    pub struct RedisStore {
        conn: redis::aio::ConnectionManager,
    }

    impl RedisStore {
        /// Connect to Redis at `url` (e.g. `redis://127.0.0.1/`)
        pub async fn connect(url: &str) -> Result<Self, StoreError> {
            let client =
                redis::Client::open(url).map_err(|e| StoreError::Unavailable(e.to_string()))?;
            let conn = redis::aio::ConnectionManager::new(client).await?;
            Ok(Self { conn })
        }
    }

    impl SessionStore for RedisStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            let mut conn = self.conn.clone();
            Ok(conn.get(key).await?)
        }

        async fn set(
            &self,
            key: &str,
            value: &str,
            ttl: Option<Duration>,
        ) -> Result<(), StoreError> {
            let mut conn = self.conn.clone();
            match ttl {
                Some(ttl) => conn.set_ex(key, value, ttl.as_secs().max(1)).await?,
                None => conn.set(key, value).await?,
            }
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            let mut conn = self.conn.clone();
            conn.del(key).await?;
            Ok(())
        }
    }
}

#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

#[cfg(test)]
mod tests {
    // SessionStore のみ use する（LocalSessionStore も可視だとメソッド解決が曖昧になる）
    use super::{MemoryStore, SessionStore};
    use std::time::Duration;

    #[tokio::test]
    async fn test_get_absent_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new();
        store.set("k", "v1", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v1".to_string()));
    }

    #[tokio::test]
    async fn test_set_overwrites_unconditionally() {
        let store = MemoryStore::new();
        store.set("k", "v1", None).await.unwrap();
        store.set("k", "v2", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v2".to_string()));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.set("k", "v", None).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let store = MemoryStore::new();
        store
            .set("k", "v", Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
