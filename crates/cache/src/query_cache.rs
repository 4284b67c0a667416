//! Two-tier query cache with tag-based invalidation.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::key::CacheKey;
use crate::store::{CacheStore, InMemoryStore};
use crate::{CacheError, Result};

/// Lifetimes of the two tiers. L1 always expires before L2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierTtls {
    l1: Duration,
    l2: Duration,
}

impl TierTtls {
    pub fn new(l1: Duration, l2: Duration) -> Result<Self> {
        if l1 >= l2 {
            return Err(CacheError::Config(format!(
                "L1 TTL ({l1:?}) must be shorter than L2 TTL ({l2:?})"
            )));
        }
        Ok(Self { l1, l2 })
    }

    pub fn l1(&self) -> Duration {
        self.l1
    }

    pub fn l2(&self) -> Duration {
        self.l2
    }
}

impl Default for TierTtls {
    fn default() -> Self {
        Self {
            l1: Duration::from_secs(30),
            l2: Duration::from_secs(300),
        }
    }
}

/// Below this many indexed keys inserts never prune.
const PRUNE_FLOOR: usize = 64;

#[derive(Debug)]
struct IndexedKey {
    tags: HashSet<String>,
    /// When the longest-lived tier drops the entry.
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct TagIndex {
    keys_by_tag: HashMap<String, HashSet<String>>,
    tags_by_key: HashMap<String, IndexedKey>,
    /// Bumped by every invalidation; loads that straddle one are not stored.
    generation: u64,
    next_prune: usize,
}

impl TagIndex {
    fn insert(&mut self, key: &str, tags: &[String], expires_at: Instant) {
        for tag in tags {
            self.keys_by_tag
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
        let indexed = self
            .tags_by_key
            .entry(key.to_string())
            .or_insert_with(|| IndexedKey {
                tags: HashSet::new(),
                expires_at,
            });
        indexed.tags.extend(tags.iter().cloned());
        indexed.expires_at = expires_at;

        if self.tags_by_key.len() >= self.next_prune {
            let pruned = self.prune_expired(Instant::now());
            tracing::trace!(pruned, "expired keys pruned from tag index");
            self.next_prune = PRUNE_FLOOR.max(self.tags_by_key.len() * 2);
        }
    }

    /// Drops a key under every tag it carries.
    fn remove_key(&mut self, key: &str) {
        let Some(indexed) = self.tags_by_key.remove(key) else {
            return;
        };
        for tag in &indexed.tags {
            if let Some(set) = self.keys_by_tag.get_mut(tag) {
                set.remove(key);
                if set.is_empty() {
                    self.keys_by_tag.remove(tag);
                }
            }
        }
    }

    fn take_tag(&mut self, tag: &str) -> Vec<String> {
        let Some(keys) = self.keys_by_tag.remove(tag) else {
            return Vec::new();
        };

        // The entries are gone from both tiers, so drop them under their other tags too.
        for key in &keys {
            self.remove_key(key);
        }
        keys.into_iter().collect()
    }

    fn prune_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .tags_by_key
            .iter()
            .filter(|(_, indexed)| indexed.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.remove_key(key);
        }
        expired.len()
    }
}

/// Caches serialized query results in a local L1 and a shared L2 tier.
///
/// Every entry is stored under one or more tags. [`invalidate_tag`] removes
/// all entries carrying a tag from both tiers; the two deletes are not
/// atomic with respect to each other.
///
/// [`invalidate_tag`]: QueryCache::invalidate_tag
pub struct QueryCache<L1 = InMemoryStore, L2 = InMemoryStore>
where
    L1: CacheStore,
    L2: CacheStore,
{
    l1: Arc<L1>,
    l2: Arc<L2>,
    ttls: TierTtls,
    index: Arc<RwLock<TagIndex>>,
}

impl QueryCache {
    /// Both tiers backed by process memory.
    pub fn in_memory(ttls: TierTtls) -> Self {
        Self::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryStore::new()),
            ttls,
        )
    }
}

impl<L1, L2> QueryCache<L1, L2>
where
    L1: CacheStore,
    L2: CacheStore,
{
    pub fn new(l1: Arc<L1>, l2: Arc<L2>, ttls: TierTtls) -> Self {
        Self {
            l1,
            l2,
            ttls,
            index: Arc::default(),
        }
    }

    pub fn ttls(&self) -> TierTtls {
        self.ttls
    }

    /// Looks in L1, then L2. An L2 hit is promoted into L1.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        let key = key.to_string();

        if let Some(raw) = self.l1.get_json(&key).await? {
            metrics::counter!("cache_hits_total", "tier" => "l1").increment(1);
            return Ok(Some(serde_json::from_str(&raw)?));
        }

        if let Some(raw) = self.l2.get_json(&key).await? {
            metrics::counter!("cache_hits_total", "tier" => "l2").increment(1);
            let value = serde_json::from_str(&raw)?;
            self.l1.set_json(&key, raw, self.ttls.l1).await?;
            return Ok(Some(value));
        }

        metrics::counter!("cache_misses_total").increment(1);
        Ok(None)
    }

    /// Stores a value in both tiers under the given tags.
    pub async fn set<T: Serialize>(&self, key: &CacheKey, value: &T, tags: &[String]) -> Result<()> {
        let mut index = self.index.write().await;
        self.write_locked(&mut index, &key.to_string(), value, tags)
            .await
    }

    /// Returns the cached value, or runs `load` and caches its result.
    ///
    /// Cache failures are logged and never fail the read. A result whose
    /// load overlapped an invalidation is returned but not stored.
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        tags: &[String],
        load: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        match self.get(key).await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %key, error = %e, "cache read failed"),
        }

        let generation = self.index.read().await.generation;
        let value = load().await?;

        let mut index = self.index.write().await;
        if index.generation != generation {
            tracing::debug!(key = %key, "skipping cache fill after concurrent invalidation");
            return Ok(value);
        }
        if let Err(e) = self
            .write_locked(&mut index, &key.to_string(), &value, tags)
            .await
        {
            tracing::warn!(key = %key, error = %e, "cache write failed");
        }
        Ok(value)
    }

    async fn write_locked<T: Serialize>(
        &self,
        index: &mut TagIndex,
        key: &str,
        value: &T,
        tags: &[String],
    ) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.l2.set_json(key, raw.clone(), self.ttls.l2).await?;
        self.l1.set_json(key, raw, self.ttls.l1).await?;
        index.insert(key, tags, Instant::now() + self.ttls.l2);
        Ok(())
    }

    /// Removes every entry tagged `tag` from both tiers. Returns how many
    /// entries were dropped.
    pub async fn invalidate_tag(&self, tag: &str) -> Result<usize> {
        let mut index = self.index.write().await;
        index.generation += 1;

        let keys = index.take_tag(tag);
        if keys.is_empty() {
            return Ok(0);
        }

        self.l1.delete_many(&keys).await?;
        self.l2.delete_many(&keys).await?;

        metrics::counter!("cache_invalidations_total").increment(keys.len() as u64);
        tracing::debug!(tag, evicted = keys.len(), "cache tag invalidated");
        Ok(keys.len())
    }

    pub async fn invalidate_tags(&self, tags: &[String]) -> Result<usize> {
        let mut evicted = 0;
        for tag in tags {
            evicted += self.invalidate_tag(tag).await?;
        }
        Ok(evicted)
    }

    pub async fn keys_for_tag(&self, tag: &str) -> Vec<String> {
        self.index
            .read()
            .await
            .keys_by_tag
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn clear(&self) -> Result<()> {
        let mut index = self.index.write().await;
        index.generation += 1;
        index.keys_by_tag.clear();
        index.tags_by_key.clear();
        self.l1.clear().await?;
        self.l2.clear().await
    }
}

impl<L1, L2> Clone for QueryCache<L1, L2>
where
    L1: CacheStore,
    L2: CacheStore,
{
    fn clone(&self) -> Self {
        Self {
            l1: self.l1.clone(),
            l2: self.l2.clone(),
            ttls: self.ttls,
            index: self.index.clone(),
        }
    }
}
