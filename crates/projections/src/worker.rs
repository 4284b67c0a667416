//! Background worker for asynchronous projections.
//!
//! Committed events arrive over an unbounded channel fed by [`WorkerFeed`].
//! Failures are logged and counted; nothing is reported back to the writer.
//! On shutdown the worker drains what is already queued, then stops.

use std::sync::Arc;

use event_store::EventEnvelope;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use crate::listener::WorkerFeed;
use crate::projection::Projection;

/// Builder for the background projection task.
#[derive(Default)]
pub struct ProjectionWorker {
    projections: Vec<Arc<dyn Projection>>,
}

/// Handle to a running [`ProjectionWorker`].
///
/// Dropping the handle does not stop the task; call
/// [`shutdown`](WorkerHandle::shutdown).
#[derive(Clone)]
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ProjectionWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projection(mut self, projection: Arc<dyn Projection>) -> Self {
        self.projections.push(projection);
        self
    }

    /// Spawns the worker task on the current runtime.
    pub fn spawn(self) -> (WorkerFeed, WorkerHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run(self.projections, receiver, shutdown_rx));

        (
            WorkerFeed::new(sender),
            WorkerHandle {
                shutdown_tx,
                task: Arc::new(Mutex::new(Some(task))),
            },
        )
    }
}

impl WorkerHandle {
    /// Signals the worker to stop and waits for it to drain its queue.
    ///
    /// Calling this more than once is safe.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);

        let task = self.task.lock().await.take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            tracing::error!(error = %e, "projection worker task panicked");
        }
    }
}

async fn run(
    projections: Vec<Arc<dyn Projection>>,
    mut receiver: mpsc::UnboundedReceiver<EventEnvelope>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    tracing::info!(projections = projections.len(), "projection worker started");

    loop {
        tokio::select! {
            biased;
            received = receiver.recv() => match received {
                Some(event) => apply(&projections, &event).await,
                None => break,
            },
            _ = shutdown_rx.changed() => {
                while let Ok(event) = receiver.try_recv() {
                    apply(&projections, &event).await;
                }
                break;
            }
        }
    }

    tracing::info!("projection worker stopped");
}

async fn apply(projections: &[Arc<dyn Projection>], event: &EventEnvelope) {
    for projection in projections {
        match projection.handle(event).await {
            Ok(()) => {
                metrics::counter!("projections_events_processed", "projection" => projection.name())
                    .increment(1);
            }
            Err(e) => {
                tracing::error!(
                    projection = projection.name(),
                    event_type = %event.event_type,
                    aggregate_id = %event.aggregate_id,
                    version = event.version.as_i64(),
                    error = %e,
                    "async projection failed"
                );
                metrics::counter!("projection_failures_total", "projection" => projection.name())
                    .increment(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionPosition;
    use crate::{ProjectionError, Result};
    use async_trait::async_trait;
    use common::AggregateId;
    use event_store::{CommitListener, Version};
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct Recording {
        seen: RwLock<Vec<i64>>,
        fail_on: Option<i64>,
    }

    #[async_trait]
    impl Projection for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn handle(&self, event: &EventEnvelope) -> Result<()> {
            if self.fail_on == Some(event.version.as_i64()) {
                return Err(ProjectionError::Projection("boom".into()));
            }
            self.seen.write().await.push(event.version.as_i64());
            Ok(())
        }

        async fn position(&self) -> ProjectionPosition {
            ProjectionPosition::zero()
        }

        async fn reset(&self) -> Result<()> {
            self.seen.write().await.clear();
            Ok(())
        }
    }

    fn event(aggregate_id: AggregateId, version: i64) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Book")
            .event_type("BookUpdated")
            .version(Version::new(version))
            .payload_raw(serde_json::json!({}))
            .build()
    }

    #[tokio::test]
    async fn worker_applies_events_in_order_and_drains_on_shutdown() {
        let recording = Arc::new(Recording::default());
        let (feed, handle) = ProjectionWorker::new()
            .with_projection(recording.clone())
            .spawn();

        let id = AggregateId::new();
        feed.on_commit(&[event(id, 1), event(id, 2)]).await.unwrap();
        feed.on_commit(&[event(id, 3)]).await.unwrap();
        handle.shutdown().await;

        assert_eq!(*recording.seen.read().await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_worker() {
        let recording = Arc::new(Recording {
            fail_on: Some(2),
            ..Default::default()
        });
        let (feed, handle) = ProjectionWorker::new()
            .with_projection(recording.clone())
            .spawn();

        let id = AggregateId::new();
        feed.on_commit(&[event(id, 1), event(id, 2), event(id, 3)])
            .await
            .unwrap();
        handle.shutdown().await;

        assert_eq!(*recording.seen.read().await, vec![1, 3]);
    }

    #[tokio::test]
    async fn feed_reports_stopped_worker() {
        let (feed, handle) = ProjectionWorker::new().spawn();
        handle.shutdown().await;
        handle.shutdown().await;

        let err = feed
            .on_commit(&[event(AggregateId::new(), 1)])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("projection-worker-feed"));
    }
}
