//! Core projection trait, position tracking and version gating.

use async_trait::async_trait;
use event_store::{EventEnvelope, Version};

use crate::{ProjectionError, Result};

/// Tracks how many events a projection has processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of events processed by this projection.
    pub events_processed: u64,
}

impl ProjectionPosition {
    /// Creates a new position at zero.
    pub fn zero() -> Self {
        Self {
            events_processed: 0,
        }
    }

    /// Advances the position by one event.
    pub fn advance(&self) -> Self {
        Self {
            events_processed: self.events_processed + 1,
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.events_processed)
    }
}

/// A projection that processes events and updates a read model.
///
/// Handling must be idempotent: an event already reflected by the read
/// model is skipped, so the same projection can be fed by a rebuild and by
/// live commits at the same time.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Handles a single event, updating the projection's read model.
    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}

/// What to do with an event given the version a document already reflects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    Apply,
    /// Already reflected.
    Skip,
}

/// Compares an event's version with the version of the document it targets.
///
/// `current` is `Version::initial()` when no document exists yet.
pub fn check_version(
    projection: &'static str,
    current: Version,
    event: &EventEnvelope,
) -> Result<VersionCheck> {
    if event.version <= current {
        return Ok(VersionCheck::Skip);
    }
    let expected = current.next();
    if event.version != expected {
        return Err(ProjectionError::OutOfOrder {
            projection,
            aggregate_id: event.aggregate_id,
            expected: expected.as_i64(),
            actual: event.version.as_i64(),
        });
    }
    Ok(VersionCheck::Apply)
}
