//! Commit-path cache eviction.

use async_trait::async_trait;
use event_store::{CommitListener, EventEnvelope, EventStoreError};
use notifications::{InvalidationRegistry, NotificationMapper};

use crate::query_cache::QueryCache;
use crate::store::CacheStore;

/// Evicts cached queries made stale by committed events.
///
/// Uses the same notification mapping and invalidation keys as live
/// clients, so server and client caches agree on what a change touches.
/// Must be registered after the synchronous projection listener.
pub struct CacheInvalidator<L1: CacheStore, L2: CacheStore> {
    cache: QueryCache<L1, L2>,
    mapper: NotificationMapper,
    registry: InvalidationRegistry,
}

impl<L1: CacheStore, L2: CacheStore> CacheInvalidator<L1, L2> {
    pub fn new(
        cache: QueryCache<L1, L2>,
        mapper: NotificationMapper,
        registry: InvalidationRegistry,
    ) -> Self {
        Self {
            cache,
            mapper,
            registry,
        }
    }

    /// Tags made stale by one event.
    pub fn tags_for(&self, event: &EventEnvelope) -> Vec<String> {
        self.mapper
            .map(event)
            .map(|notification| self.registry.keys_for(&notification))
            .unwrap_or_default()
    }
}

#[async_trait]
impl<L1, L2> CommitListener for CacheInvalidator<L1, L2>
where
    L1: CacheStore + 'static,
    L2: CacheStore + 'static,
{
    fn name(&self) -> &'static str {
        "cache-invalidator"
    }

    async fn on_commit(&self, events: &[EventEnvelope]) -> event_store::Result<()> {
        let mut tags: Vec<String> = events.iter().flat_map(|e| self.tags_for(e)).collect();
        tags.sort();
        tags.dedup();

        if tags.is_empty() {
            return Ok(());
        }

        let evicted = self
            .cache
            .invalidate_tags(&tags)
            .await
            .map_err(|e| EventStoreError::Listener {
                listener: "cache-invalidator",
                message: e.to_string(),
            })?;

        tracing::debug!(?tags, evicted, "cache invalidated for commit");
        Ok(())
    }
}
