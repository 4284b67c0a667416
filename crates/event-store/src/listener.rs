//! Post-commit dispatch.
//!
//! [`ObservedEventStore`] wraps any store and hands every successfully
//! appended batch to a list of [`CommitListener`]s in registration order.
//! Appends and dispatch for one stream are serialized by a per-stream lock,
//! so each listener observes a stream's events in version order. Streams
//! never wait on each other.
//!
//! Append and dispatch run on a spawned task: once an append has started,
//! dropping the caller's future cannot keep a committed batch from its
//! listeners or leak the stream's lock entry.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, Version,
    store::{AppendOptions, EventStore, EventStream},
};

/// Receives batches after they are durably appended.
///
/// A failing listener is logged and counted; the append it follows has
/// already succeeded and is reported as such to the caller.
#[async_trait]
pub trait CommitListener: Send + Sync {
    /// Name used in logs and metric labels.
    fn name(&self) -> &'static str;

    async fn on_commit(&self, events: &[EventEnvelope]) -> Result<()>;
}

type StreamLocks = Arc<std::sync::Mutex<HashMap<AggregateId, Arc<Mutex<()>>>>>;

/// Event store decorator that notifies listeners after each commit.
pub struct ObservedEventStore<S> {
    inner: S,
    listeners: Vec<Arc<dyn CommitListener>>,
    stream_locks: StreamLocks,
}

impl<S: EventStore> ObservedEventStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            listeners: Vec::new(),
            stream_locks: Arc::default(),
        }
    }

    /// Appends a listener; listeners run in the order they were added.
    pub fn with_listener(mut self, listener: Arc<dyn CommitListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn listener_names(&self) -> Vec<&'static str> {
        self.listeners.iter().map(|l| l.name()).collect()
    }

    fn lock_for(&self, aggregate_id: AggregateId) -> Arc<Mutex<()>> {
        let mut locks = self
            .stream_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(aggregate_id).or_default().clone()
    }

    fn release(&self, aggregate_id: AggregateId, lock: Arc<Mutex<()>>) {
        let mut locks = self
            .stream_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Only the map and this handle remain: nobody is waiting.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&aggregate_id);
        }
    }

    async fn dispatch(&self, events: &[EventEnvelope]) {
        for listener in &self.listeners {
            if let Err(e) = listener.on_commit(events).await {
                tracing::error!(
                    listener = listener.name(),
                    aggregate_id = %events[0].aggregate_id,
                    error = %e,
                    "commit listener failed"
                );
                metrics::counter!("commit_listener_failures_total", "listener" => listener.name())
                    .increment(1);
            }
        }
    }
}

impl<S: Clone> Clone for ObservedEventStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            listeners: self.listeners.clone(),
            stream_locks: self.stream_locks.clone(),
        }
    }
}

impl<S: EventStore> ObservedEventStore<S> {
    async fn append_and_dispatch(
        &self,
        aggregate_id: AggregateId,
        events: Vec<EventEnvelope>,
        options: AppendOptions,
    ) -> Result<Version> {
        let lock = self.lock_for(aggregate_id);
        let result = {
            let _guard = lock.lock().await;
            match self.inner.append(events.clone(), options).await {
                Ok(version) => {
                    self.dispatch(&events).await;
                    Ok(version)
                }
                Err(e) => Err(e),
            }
        };
        self.release(aggregate_id, lock);

        result
    }
}

#[async_trait]
impl<S: EventStore + Clone + 'static> EventStore for ObservedEventStore<S> {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        let Some(aggregate_id) = events.first().map(|e| e.aggregate_id) else {
            return self.inner.append(events, options).await;
        };

        let store = self.clone();
        tokio::spawn(async move { store.append_and_dispatch(aggregate_id, events, options).await })
            .await
            .map_err(|e| EventStoreError::CommitTask(e.to_string()))?
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        self.inner.get_events_for_aggregate(aggregate_id).await
    }

    async fn get_events_for_aggregate_up_to(
        &self,
        aggregate_id: AggregateId,
        up_to: Version,
    ) -> Result<Vec<EventEnvelope>> {
        self.inner
            .get_events_for_aggregate_up_to(aggregate_id, up_to)
            .await
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        self.inner.query_events(query).await
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        self.inner.stream_all_events().await
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        self.inner.get_aggregate_version(aggregate_id).await
    }
}
