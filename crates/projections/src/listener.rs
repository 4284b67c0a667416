//! Commit listeners that feed projections from the write path.

use std::sync::Arc;

use async_trait::async_trait;
use event_store::{CommitListener, EventEnvelope, EventStoreError};
use tokio::sync::mpsc;

use crate::projection::Projection;

/// Applies committed events to synchronous projections before the command
/// returns, giving read-your-writes for those views.
pub struct ProjectionListener {
    projections: Vec<Arc<dyn Projection>>,
}

impl ProjectionListener {
    pub fn new(projections: Vec<Arc<dyn Projection>>) -> Self {
        Self { projections }
    }
}

#[async_trait]
impl CommitListener for ProjectionListener {
    fn name(&self) -> &'static str {
        "sync-projections"
    }

    async fn on_commit(&self, events: &[EventEnvelope]) -> event_store::Result<()> {
        let mut first_failure = None;

        for event in events {
            for projection in &self.projections {
                match projection.handle(event).await {
                    Ok(()) => {
                        metrics::counter!("projections_events_processed", "projection" => projection.name())
                            .increment(1);
                    }
                    Err(e) => {
                        metrics::counter!("projection_failures_total", "projection" => projection.name())
                            .increment(1);
                        first_failure.get_or_insert_with(|| EventStoreError::Listener {
                            listener: self.name(),
                            message: format!("{}: {e}", projection.name()),
                        });
                    }
                }
            }
        }

        first_failure.map_or(Ok(()), Err)
    }
}

/// Forwards committed events to the background [`ProjectionWorker`].
///
/// [`ProjectionWorker`]: crate::worker::ProjectionWorker
#[derive(Clone)]
pub struct WorkerFeed {
    sender: mpsc::UnboundedSender<EventEnvelope>,
}

impl WorkerFeed {
    pub(crate) fn new(sender: mpsc::UnboundedSender<EventEnvelope>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl CommitListener for WorkerFeed {
    fn name(&self) -> &'static str {
        "projection-worker-feed"
    }

    async fn on_commit(&self, events: &[EventEnvelope]) -> event_store::Result<()> {
        for event in events {
            self.sender
                .send(event.clone())
                .map_err(|_| EventStoreError::Listener {
                    listener: self.name(),
                    message: "projection worker is not running".to_string(),
                })?;
        }
        Ok(())
    }
}
