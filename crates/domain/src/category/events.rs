//! Category domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::Translations;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CategoryEvent {
    CategoryCreated(CategoryCreatedData),
    CategoryUpdated(CategoryUpdatedData),
    CategorySoftDeleted(CategorySoftDeletedData),
    CategoryRestored(CategoryRestoredData),
}

impl DomainEvent for CategoryEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        "CategoryCreated",
        "CategoryUpdated",
        "CategorySoftDeleted",
        "CategoryRestored",
    ];

    fn event_type(&self) -> &'static str {
        match self {
            CategoryEvent::CategoryCreated(_) => "CategoryCreated",
            CategoryEvent::CategoryUpdated(_) => "CategoryUpdated",
            CategoryEvent::CategorySoftDeleted(_) => "CategorySoftDeleted",
            CategoryEvent::CategoryRestored(_) => "CategoryRestored",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCreatedData {
    pub category_id: AggregateId,
    pub name: Translations,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryUpdatedData {
    pub name: Translations,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySoftDeletedData {
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRestoredData {
    pub restored_at: DateTime<Utc>,
}

impl CategoryEvent {
    pub fn name(&self) -> Option<&Translations> {
        match self {
            CategoryEvent::CategoryCreated(d) => Some(&d.name),
            CategoryEvent::CategoryUpdated(d) => Some(&d.name),
            _ => None,
        }
    }
}
