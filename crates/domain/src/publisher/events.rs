//! Publisher domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PublisherEvent {
    PublisherCreated(PublisherCreatedData),
    PublisherUpdated(PublisherUpdatedData),
    PublisherSoftDeleted(PublisherSoftDeletedData),
    PublisherRestored(PublisherRestoredData),
}

impl DomainEvent for PublisherEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        "PublisherCreated",
        "PublisherUpdated",
        "PublisherSoftDeleted",
        "PublisherRestored",
    ];

    fn event_type(&self) -> &'static str {
        match self {
            PublisherEvent::PublisherCreated(_) => "PublisherCreated",
            PublisherEvent::PublisherUpdated(_) => "PublisherUpdated",
            PublisherEvent::PublisherSoftDeleted(_) => "PublisherSoftDeleted",
            PublisherEvent::PublisherRestored(_) => "PublisherRestored",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherCreatedData {
    pub publisher_id: AggregateId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherUpdatedData {
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherSoftDeletedData {
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherRestoredData {
    pub restored_at: DateTime<Utc>,
}

impl PublisherEvent {
    pub fn name(&self) -> Option<&str> {
        match self {
            PublisherEvent::PublisherCreated(d) => Some(&d.name),
            PublisherEvent::PublisherUpdated(d) => Some(&d.name),
            _ => None,
        }
    }
}
