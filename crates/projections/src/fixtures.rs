//! Envelope builders shared by the view tests.

use std::collections::BTreeSet;

use chrono::Utc;
use common::{AggregateId, Currency, Locale};
use domain::author::{AuthorCreatedData, AuthorUpdatedData};
use domain::book::{
    BookCreatedData, BookRestoredData, BookSoftDeletedData, BookUpdatedData,
};
use domain::category::CategoryCreatedData;
use domain::publisher::PublisherCreatedData;
use domain::{
    AuthorEvent, BookEvent, CategoryEvent, DomainEvent, Isbn, Prices, PublisherEvent,
    Translations,
};
use event_store::{EventEnvelope, Version};
use serde::Serialize;

pub fn envelope<E: DomainEvent + Serialize>(
    aggregate_type: &str,
    aggregate_id: AggregateId,
    version: i64,
    event: &E,
) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id)
        .aggregate_type(aggregate_type)
        .event_type(event.event_type())
        .version(Version::new(version))
        .payload(event)
        .unwrap()
        .build()
}

pub fn en(text: &str) -> Translations {
    Translations::new().with(Locale::parse("en").unwrap(), text)
}

pub fn ids(items: &[AggregateId]) -> BTreeSet<AggregateId> {
    items.iter().copied().collect()
}

pub fn book_created(
    book_id: AggregateId,
    title: &str,
    publisher_id: Option<AggregateId>,
    author_ids: &[AggregateId],
    category_ids: &[AggregateId],
) -> EventEnvelope {
    let event = BookEvent::BookCreated(BookCreatedData {
        book_id,
        title: en(title),
        description: Translations::new(),
        isbn: Isbn::parse("9780441013593").unwrap(),
        publisher_id,
        author_ids: ids(author_ids),
        category_ids: ids(category_ids),
        prices: Prices::new().with(Currency::parse("EUR").unwrap(), 999),
        created_at: Utc::now(),
    });
    envelope("Book", book_id, 1, &event)
}

pub fn book_updated(
    book_id: AggregateId,
    version: i64,
    title: &str,
    publisher_id: Option<AggregateId>,
    author_ids: &[AggregateId],
    category_ids: &[AggregateId],
) -> EventEnvelope {
    let event = BookEvent::BookUpdated(BookUpdatedData {
        title: en(title),
        description: Translations::new(),
        isbn: Isbn::parse("9780441013593").unwrap(),
        publisher_id,
        author_ids: ids(author_ids),
        category_ids: ids(category_ids),
        prices: Prices::new().with(Currency::parse("EUR").unwrap(), 999),
        updated_at: Utc::now(),
    });
    envelope("Book", book_id, version, &event)
}

pub fn book_deleted(book_id: AggregateId, version: i64) -> EventEnvelope {
    let event = BookEvent::BookSoftDeleted(BookSoftDeletedData {
        deleted_at: Utc::now(),
    });
    envelope("Book", book_id, version, &event)
}

pub fn book_restored(book_id: AggregateId, version: i64) -> EventEnvelope {
    let event = BookEvent::BookRestored(BookRestoredData {
        restored_at: Utc::now(),
    });
    envelope("Book", book_id, version, &event)
}

pub fn author_created(author_id: AggregateId, name: &str) -> EventEnvelope {
    let event = AuthorEvent::AuthorCreated(AuthorCreatedData {
        author_id,
        name: name.to_string(),
        biography: Translations::new(),
        created_at: Utc::now(),
    });
    envelope("Author", author_id, 1, &event)
}

pub fn author_renamed(author_id: AggregateId, version: i64, name: &str) -> EventEnvelope {
    let event = AuthorEvent::AuthorUpdated(AuthorUpdatedData {
        name: name.to_string(),
        biography: Translations::new(),
        updated_at: Utc::now(),
    });
    envelope("Author", author_id, version, &event)
}

pub fn publisher_created(publisher_id: AggregateId, name: &str) -> EventEnvelope {
    let event = PublisherEvent::PublisherCreated(PublisherCreatedData {
        publisher_id,
        name: name.to_string(),
        created_at: Utc::now(),
    });
    envelope("Publisher", publisher_id, 1, &event)
}

pub fn category_created(category_id: AggregateId, name: &str) -> EventEnvelope {
    let event = CategoryEvent::CategoryCreated(CategoryCreatedData {
        category_id,
        name: en(name),
        created_at: Utc::now(),
    });
    envelope("Category", category_id, 1, &event)
}
