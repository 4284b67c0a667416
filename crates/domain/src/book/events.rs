//! Book domain events.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::{CoverRef, Isbn, Prices, Sale, Translations};

/// Events that can occur on a book aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BookEvent {
    BookCreated(BookCreatedData),

    /// Carries the complete new field values and reference sets.
    BookUpdated(BookUpdatedData),

    BookSoftDeleted(BookSoftDeletedData),

    BookRestored(BookRestoredData),

    BookSaleScheduled(BookSaleScheduledData),

    BookSaleCancelled(BookSaleCancelledData),

    BookCoverUpdated(BookCoverUpdatedData),
}

impl DomainEvent for BookEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        "BookCreated",
        "BookUpdated",
        "BookSoftDeleted",
        "BookRestored",
        "BookSaleScheduled",
        "BookSaleCancelled",
        "BookCoverUpdated",
    ];

    fn event_type(&self) -> &'static str {
        match self {
            BookEvent::BookCreated(_) => "BookCreated",
            BookEvent::BookUpdated(_) => "BookUpdated",
            BookEvent::BookSoftDeleted(_) => "BookSoftDeleted",
            BookEvent::BookRestored(_) => "BookRestored",
            BookEvent::BookSaleScheduled(_) => "BookSaleScheduled",
            BookEvent::BookSaleCancelled(_) => "BookSaleCancelled",
            BookEvent::BookCoverUpdated(_) => "BookCoverUpdated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookCreatedData {
    pub book_id: AggregateId,
    pub title: Translations,
    #[serde(default)]
    pub description: Translations,
    pub isbn: Isbn,
    pub publisher_id: Option<AggregateId>,
    pub author_ids: BTreeSet<AggregateId>,
    pub category_ids: BTreeSet<AggregateId>,
    pub prices: Prices,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookUpdatedData {
    pub title: Translations,
    #[serde(default)]
    pub description: Translations,
    pub isbn: Isbn,
    pub publisher_id: Option<AggregateId>,
    pub author_ids: BTreeSet<AggregateId>,
    pub category_ids: BTreeSet<AggregateId>,
    pub prices: Prices,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSoftDeletedData {
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRestoredData {
    pub restored_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSaleScheduledData {
    pub sale: Sale,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSaleCancelledData {
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookCoverUpdatedData {
    pub cover: CoverRef,
    pub updated_at: DateTime<Utc>,
}

impl BookEvent {
    /// Reference sets carried by the event, when it carries any.
    pub fn references(&self) -> Option<BookReferences> {
        match self {
            BookEvent::BookCreated(d) => Some(BookReferences {
                publisher_id: d.publisher_id,
                author_ids: d.author_ids.clone(),
                category_ids: d.category_ids.clone(),
            }),
            BookEvent::BookUpdated(d) => Some(BookReferences {
                publisher_id: d.publisher_id,
                author_ids: d.author_ids.clone(),
                category_ids: d.category_ids.clone(),
            }),
            _ => None,
        }
    }

    /// Title translations, for events that carry one.
    pub fn title(&self) -> Option<&Translations> {
        match self {
            BookEvent::BookCreated(d) => Some(&d.title),
            BookEvent::BookUpdated(d) => Some(&d.title),
            _ => None,
        }
    }
}

/// The ids a book points at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookReferences {
    pub publisher_id: Option<AggregateId>,
    pub author_ids: BTreeSet<AggregateId>,
    pub category_ids: BTreeSet<AggregateId>,
}
