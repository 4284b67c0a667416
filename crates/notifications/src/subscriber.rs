//! Client-side query refresh driven by notifications.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Result;
use crate::notification::Notification;
use crate::registry::InvalidationRegistry;

/// Fetches the data behind one query.
#[async_trait]
pub trait QueryLoader: Send + Sync {
    type Data: Clone + Send + Sync;

    async fn load(&self) -> Result<Self::Data>;
}

/// How a subscriber refreshed after a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMode {
    /// Cached data stayed visible while the reload ran.
    Silent,
    /// Nothing was cached, so the load was shown as loading.
    Loading,
}

/// A query that declares the invalidation keys it depends on.
pub struct QuerySubscriber<L: QueryLoader> {
    keys: BTreeSet<String>,
    loader: L,
    data: RwLock<Option<L::Data>>,
    loading: AtomicBool,
}

impl<L: QueryLoader> QuerySubscriber<L> {
    pub fn new<I, K>(keys: I, loader: L) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            loader,
            data: RwLock::new(None),
            loading: AtomicBool::new(false),
        }
    }

    pub fn keys(&self) -> &BTreeSet<String> {
        &self.keys
    }

    /// True only while a non-silent load is running.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub async fn data(&self) -> Option<L::Data> {
        self.data.read().await.clone()
    }

    /// Loads the query, silently when data is already cached.
    pub async fn refresh(&self) -> Result<ReloadMode> {
        let mode = if self.data.read().await.is_some() {
            ReloadMode::Silent
        } else {
            ReloadMode::Loading
        };

        if mode == ReloadMode::Loading {
            self.loading.store(true, Ordering::Release);
        }
        let loaded = self.loader.load().await;
        self.loading.store(false, Ordering::Release);

        // A failed reload keeps whatever was cached.
        *self.data.write().await = Some(loaded?);
        Ok(mode)
    }

    /// Reacts to a notification. Returns the reload mode when the
    /// notification's keys intersect this subscriber's keys, `None` otherwise.
    /// A resync notification reloads every subscriber.
    pub async fn on_notification(
        &self,
        registry: &InvalidationRegistry,
        notification: &Notification,
    ) -> Result<Option<ReloadMode>> {
        let stale = notification.is_resync()
            || registry
                .keys_for(notification)
                .iter()
                .any(|key| self.keys.contains(key));

        if !stale {
            return Ok(None);
        }

        tracing::debug!(
            notification_type = %notification.notification_type,
            "query invalidated"
        );
        self.refresh().await.map(Some)
    }
}
