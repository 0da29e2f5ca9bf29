//! External ordered list store client.
//!
//! Exposes only the four commands the telemetry window needs, so the window can
//! run against redis in production and an in-memory fake in tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::time::timeout;

const STORE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store command failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store command timed out after {0:?}")]
    Timeout(Duration),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Minimal list-store surface. No transactional guarantees are assumed.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Append `value` to the back of the list at `key`.
    async fn push(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove and return the front of the list, `None` if it is empty.
    async fn pop_front(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn length(&self, key: &str) -> Result<usize, StoreError>;

    /// Read a plain string value.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// Redis-backed list store.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = timeout(STORE_TIMEOUT, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| StoreError::Timeout(STORE_TIMEOUT))??;

        tracing::debug!(url = %url, "Connected to telemetry store");
        Ok(Self { conn })
    }
}

async fn bounded<T, F>(fut: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = redis::RedisResult<T>>,
{
    Ok(timeout(STORE_TIMEOUT, fut)
        .await
        .map_err(|_| StoreError::Timeout(STORE_TIMEOUT))??)
}

#[async_trait]
impl ListStore for RedisStore {
    async fn push(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        bounded(conn.rpush::<_, _, ()>(key, value)).await
    }

    async fn pop_front(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        bounded(conn.lpop::<_, Option<String>>(key, None)).await
    }

    async fn length(&self, key: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        bounded(conn.llen::<_, usize>(key)).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        bounded(conn.get::<_, Option<String>>(key)).await
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    lists: HashMap<String, VecDeque<String>>,
    values: HashMap<String, String>,
}

/// In-process list store, shared by reference between "processes" in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every command fails, as if the server were down.
    pub fn unavailable() -> Self {
        Self {
            state: Mutex::default(),
            unavailable: true,
        }
    }

    /// Seed a plain string value.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.lock().values.insert(key.to_string(), value.into());
    }

    /// Snapshot of the list at `key`, front first.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.lock()
            .lists
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ListStore for MemoryStore {
    async fn push(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        self.lock()
            .lists
            .entry(key.to_string())
            .or_default()
            .push_back(value.to_string());
        Ok(())
    }

    async fn pop_front(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.lock().lists.get_mut(key).and_then(VecDeque::pop_front))
    }

    async fn length(&self, key: &str) -> Result<usize, StoreError> {
        self.check()?;
        Ok(self.lock().lists.get(key).map_or(0, VecDeque::len))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.lock().values.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_is_fifo() {
        let store = MemoryStore::new();
        store.push("k", "1").await.unwrap();
        store.push("k", "2").await.unwrap();

        assert_eq!(store.length("k").await.unwrap(), 2);
        assert_eq!(store.pop_front("k").await.unwrap(), Some("1".into()));
        assert_eq!(store.pop_front("k").await.unwrap(), Some("2".into()));
        assert_eq!(store.pop_front("k").await.unwrap(), None);
        assert_eq!(store.length("missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_command() {
        let store = MemoryStore::unavailable();
        assert!(store.push("k", "1").await.is_err());
        assert!(store.length("k").await.is_err());
        assert!(store.get("k").await.is_err());
    }
}
