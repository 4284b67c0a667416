//! Author domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::Translations;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AuthorEvent {
    AuthorCreated(AuthorCreatedData),
    AuthorUpdated(AuthorUpdatedData),
    AuthorSoftDeleted(AuthorSoftDeletedData),
    AuthorRestored(AuthorRestoredData),
}

impl DomainEvent for AuthorEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        "AuthorCreated",
        "AuthorUpdated",
        "AuthorSoftDeleted",
        "AuthorRestored",
    ];

    fn event_type(&self) -> &'static str {
        match self {
            AuthorEvent::AuthorCreated(_) => "AuthorCreated",
            AuthorEvent::AuthorUpdated(_) => "AuthorUpdated",
            AuthorEvent::AuthorSoftDeleted(_) => "AuthorSoftDeleted",
            AuthorEvent::AuthorRestored(_) => "AuthorRestored",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorCreatedData {
    pub author_id: AggregateId,
    pub name: String,
    #[serde(default)]
    pub biography: Translations,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorUpdatedData {
    pub name: String,
    #[serde(default)]
    pub biography: Translations,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSoftDeletedData {
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRestoredData {
    pub restored_at: DateTime<Utc>,
}

impl AuthorEvent {
    /// The author's name after this event, when the event sets one.
    pub fn name(&self) -> Option<&str> {
        match self {
            AuthorEvent::AuthorCreated(d) => Some(&d.name),
            AuthorEvent::AuthorUpdated(d) => Some(&d.name),
            _ => None,
        }
    }
}
