//! Cache backends.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::Result;

/// A key/value store holding serialized JSON with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get_json(&self, key: &str) -> Result<Option<String>>;

    async fn set_json(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// Below this many entries writes never sweep.
const SWEEP_FLOOR: usize = 64;

/// Process-local store.
///
/// Expired entries are dropped lazily on read, and swept in bulk whenever a
/// write grows the map past twice its size after the previous sweep.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    next_sweep: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    async fn get_json(&self, key: &str) -> Result<Option<String>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.value.clone()));
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_json(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), entry);

        if entries.len() >= self.next_sweep.load(Ordering::Relaxed) {
            let now = Instant::now();
            let before = entries.len();
            entries.retain(|_, entry| entry.expires_at > now);
            tracing::trace!(swept = before - entries.len(), "expired cache entries swept");
            self.next_sweep
                .store(SWEEP_FLOOR.max(entries.len() * 2), Ordering::Relaxed);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let store = InMemoryStore::new();

        store
            .set_json("k", "\"v\"".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get_json("k").await.unwrap().as_deref(), Some("\"v\""));

        store.delete("k").await.unwrap();
        assert_eq!(store.get_json("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire() {
        let store = InMemoryStore::new();
        store
            .set_json("k", "1".into(), Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.get_json("k").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn delete_many_and_clear() {
        let store = InMemoryStore::new();
        for key in ["a", "b", "c"] {
            store
                .set_json(key, "1".into(), Duration::from_secs(60))
                .await
                .unwrap();
        }

        store
            .delete_many(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);

        store.clear().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn writes_sweep_expired_entries() {
        let store = InMemoryStore::new();
        for i in 0..SWEEP_FLOOR - 1 {
            store
                .set_json(&format!("old-{i}"), "1".into(), Duration::from_millis(10))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(40)).await;

        store
            .set_json("fresh", "1".into(), Duration::from_secs(60))
            .await
            .unwrap();

        let entries = store.entries.read().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("fresh"));
    }
}
