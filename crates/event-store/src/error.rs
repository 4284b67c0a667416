use thiserror::Error;

use crate::{AggregateId, Version};

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The stream was not at the expected version when appending.
    #[error(
        "Concurrency conflict for stream {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    /// The batch handed to `append` is malformed (empty, mixed streams, gaps).
    #[error("Invalid append: {0}")]
    InvalidAppend(String),

    /// A commit listener failed after the events were durably appended.
    #[error("Commit listener {listener} failed: {message}")]
    Listener {
        listener: &'static str,
        message: String,
    },

    /// The detached append-and-dispatch task panicked or was aborted.
    #[error("Commit task failed: {0}")]
    CommitTask(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Returns true for storage failures a caller may retry transparently.
    ///
    /// Concurrency conflicts are excluded: retrying them requires a fresh read.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EventStoreError::Database(
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            )
        )
    }
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
