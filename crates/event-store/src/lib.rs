pub mod error;
pub mod etag;
pub mod event;
pub mod listener;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use etag::{ETag, ETagParseError};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use listener::{CommitListener, ObservedEventStore};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use query::EventQuery;
pub use store::{AppendOptions, EventStore, EventStoreExt, EventStream};
