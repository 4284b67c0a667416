//! Projection processor for feeding events to projections.

use std::sync::Arc;

use event_store::{EventEnvelope, EventStore};
use futures_util::StreamExt;

use crate::projection::Projection;
use crate::{ProjectionError, Result};

/// Processes events from an event store and delivers them to projections.
///
/// The processor supports:
/// - Catch-up: replays all events from the store to bring projections up to date
/// - Single event delivery: delivers a new event to all projections
/// - Rebuild: resets one or all projections and replays from scratch
///
/// Projections are shared: the same view is typically also registered with
/// a commit listener or the background worker, and queried by the API.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Arc<dyn Projection>>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    /// Creates a new processor with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Arc<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    pub fn projection_names(&self) -> Vec<&'static str> {
        self.projections.iter().map(|p| p.name()).collect()
    }

    /// Runs catch-up processing: streams all events from the store and delivers
    /// every one of them to each projection.
    ///
    /// Events a projection already reflects are skipped by its own version
    /// check, so catch-up can overlap live commits and still converge.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<()> {
        self.replay(&self.projections).await
    }

    async fn replay(&self, projections: &[Arc<dyn Projection>]) -> Result<()> {
        let mut stream = self.store.stream_all_events().await?;
        let mut streamed: u64 = 0;

        while let Some(result) = stream.next().await {
            let event = result?;
            streamed += 1;

            for projection in projections {
                projection.handle(&event).await?;
                metrics::counter!("projections_events_processed", "projection" => projection.name())
                    .increment(1);
            }
        }

        tracing::info!(events_streamed = streamed, "catch-up complete");

        Ok(())
    }

    /// Delivers a single event to all registered projections.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<()> {
        for projection in &self.projections {
            projection.handle(event).await?;
            metrics::counter!("projections_events_processed", "projection" => projection.name())
                .increment(1);
        }
        Ok(())
    }

    /// Resets the named projection and replays the whole log into it.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild(&self, name: &str) -> Result<()> {
        let projection = self
            .projections
            .iter()
            .find(|p| p.name() == name)
            .cloned()
            .ok_or_else(|| ProjectionError::UnknownProjection(name.to_string()))?;

        projection.reset().await?;
        self.replay(std::slice::from_ref(&projection)).await?;
        tracing::info!(projection = name, "projection rebuilt");
        Ok(())
    }

    /// Resets all projections and replays all events from the store.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.run_catch_up().await
    }
}
