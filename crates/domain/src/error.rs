//! Domain error types.

use event_store::{ETag, EventStoreError};
use thiserror::Error;

use crate::author::AuthorError;
use crate::book::BookError;
use crate::category::CategoryError;
use crate::publisher::PublisherError;

/// Coarse classification callers use to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input rejected before any state was consulted beyond settings.
    Validation,
    /// A rule of the entity's current state refused the operation.
    Domain,
    /// The stream moved since the caller last read it.
    Concurrency,
    NotFound,
    /// Storage or serialization failed; the operation may succeed if retried.
    Infrastructure,
}

/// A rejected field and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error("Book error: {0}")]
    Book(BookError),

    #[error("Author error: {0}")]
    Author(AuthorError),

    #[error("Publisher error: {0}")]
    Publisher(PublisherError),

    #[error("Category error: {0}")]
    Category(CategoryError),

    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// The caller's entity tag no longer matches the stream.
    #[error("Precondition failed: expected version {expected}, current version {actual}")]
    PreconditionFailed { expected: ETag, actual: ETag },

    /// A stored event carries a name no decoder or alias knows about.
    #[error("Unknown event type {event_type} for {aggregate_type}")]
    UnknownEventType {
        aggregate_type: &'static str,
        event_type: String,
    },

    #[error("Unsupported schema version {schema_version} for {event_type}")]
    UnsupportedSchemaVersion {
        event_type: String,
        schema_version: i32,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
                ErrorKind::Concurrency
            }
            DomainError::EventStore(_) => ErrorKind::Infrastructure,
            DomainError::Book(e) => e.kind(),
            DomainError::Author(e) => e.kind(),
            DomainError::Publisher(e) => e.kind(),
            DomainError::Category(e) => e.kind(),
            DomainError::AggregateNotFound { .. } => ErrorKind::NotFound,
            DomainError::PreconditionFailed { .. } => ErrorKind::Concurrency,
            DomainError::UnknownEventType { .. }
            | DomainError::UnsupportedSchemaVersion { .. }
            | DomainError::Serialization(_) => ErrorKind::Infrastructure,
        }
    }

    /// Only infrastructure failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Infrastructure
    }

    /// The offending field for validation failures.
    pub fn field(&self) -> Option<&'static str> {
        let validation = match self {
            DomainError::Book(BookError::Invalid(e))
            | DomainError::Author(AuthorError::Invalid(e))
            | DomainError::Publisher(PublisherError::Invalid(e))
            | DomainError::Category(CategoryError::Invalid(e)) => e,
            _ => return None,
        };
        Some(validation.field)
    }

    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })
        )
    }
}
