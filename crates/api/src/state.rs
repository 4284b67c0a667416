//! Shared application state and commit-path wiring.

use std::sync::Arc;
use std::time::Duration;

use cache::{CacheInvalidator, QueryCache};
use common::CatalogSettings;
use domain::{AuthorService, BookService, CategoryService, PublisherService};
use event_store::{EventStore, ObservedEventStore};
use notifications::{InvalidationRegistry, NotificationHub, NotificationMapper};
use projections::{
    CatalogViews, ProjectionListener, ProjectionProcessor, ProjectionWorker, WorkerHandle,
};

use crate::config::{Config, ConfigError};

/// The store every command goes through: appends fan out to listeners.
pub type CatalogStore<S> = ObservedEventStore<S>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore + Clone + 'static> {
    pub settings: Arc<CatalogSettings>,
    pub books: BookService<CatalogStore<S>>,
    pub authors: AuthorService<CatalogStore<S>>,
    pub publishers: PublisherService<CatalogStore<S>>,
    pub categories: CategoryService<CatalogStore<S>>,
    pub views: CatalogViews,
    pub processor: ProjectionProcessor<S>,
    pub hub: NotificationHub,
    pub cache: QueryCache,
    pub worker: WorkerHandle,
    pub sse_keep_alive: Duration,
}

impl<S: EventStore + Clone + 'static> AppState<S> {
    /// Builds the state around `store`.
    ///
    /// Listeners run in this order after every append: synchronous
    /// projections, cache invalidation, notification fan-out, then the
    /// background worker feed. Must be called inside a tokio runtime.
    pub fn build(store: S, config: &Config) -> Result<Arc<Self>, ConfigError> {
        let settings = Arc::new(config.catalog_settings()?);
        let cache = QueryCache::in_memory(config.cache_ttls()?);
        let mapper = NotificationMapper::new(settings.clone());
        let hub = NotificationHub::new(config.notification_capacity, mapper.clone());
        let views = CatalogViews::new(settings.clone());

        let mut worker = ProjectionWorker::new();
        for projection in views.asynchronous() {
            worker = worker.with_projection(projection);
        }
        let (feed, worker) = worker.spawn();

        let invalidator =
            CacheInvalidator::new(cache.clone(), mapper, InvalidationRegistry::catalog());

        let observed = ObservedEventStore::new(store.clone())
            .with_listener(Arc::new(ProjectionListener::new(views.synchronous())))
            .with_listener(Arc::new(invalidator))
            .with_listener(Arc::new(hub.clone()))
            .with_listener(Arc::new(feed));
        tracing::info!(listeners = ?observed.listener_names(), "commit pipeline ready");

        let mut processor = ProjectionProcessor::new(store);
        for projection in views.all() {
            processor.register(projection);
        }

        Ok(Arc::new(Self {
            books: BookService::new(observed.clone(), settings.clone()),
            authors: AuthorService::new(observed.clone(), settings.clone()),
            publishers: PublisherService::new(observed.clone()),
            categories: CategoryService::new(observed, settings.clone()),
            settings,
            views,
            processor,
            hub,
            cache,
            worker,
            sse_keep_alive: config.sse_keep_alive,
        }))
    }
}
