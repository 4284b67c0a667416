//! Projection error types.

use common::AggregateId;
use thiserror::Error;

/// Errors that can occur during projection processing.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] event_store::EventStoreError),

    /// A stored event could not be decoded into its domain type.
    #[error("Event decoding error: {0}")]
    Decoding(#[from] domain::DomainError),

    /// The event skips at least one version of its stream.
    #[error(
        "{projection}: out-of-order event for {aggregate_id}: expected version {expected}, got {actual}"
    )]
    OutOfOrder {
        projection: &'static str,
        aggregate_id: AggregateId,
        expected: i64,
        actual: i64,
    },

    /// No projection with this name is registered.
    #[error("Unknown projection: {0}")]
    UnknownProjection(String),

    /// A projection-specific error.
    #[error("Projection error: {0}")]
    Projection(String),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
