//! Committed event → notification mapping.

use std::sync::Arc;

use common::CatalogSettings;
use domain::{Author, Book, Category, Publisher, canonical_event_type, decode_event};
use event_store::EventEnvelope;

use crate::notification::Notification;

/// Stored event type → outward notification type. Event types absent from
/// this table produce no notification.
const NOTIFICATION_TYPES: &[(&str, &str)] = &[
    ("BookCreated", "BookCreated"),
    ("BookUpdated", "BookUpdated"),
    ("BookSoftDeleted", "BookDeleted"),
    ("BookRestored", "BookRestored"),
    ("BookSaleScheduled", "BookSaleChanged"),
    ("BookSaleCancelled", "BookSaleChanged"),
    ("BookCoverUpdated", "BookCoverUpdated"),
    ("AuthorCreated", "AuthorCreated"),
    ("AuthorUpdated", "AuthorUpdated"),
    ("AuthorSoftDeleted", "AuthorDeleted"),
    ("AuthorRestored", "AuthorRestored"),
    ("PublisherCreated", "PublisherCreated"),
    ("PublisherUpdated", "PublisherUpdated"),
    ("PublisherSoftDeleted", "PublisherDeleted"),
    ("PublisherRestored", "PublisherRestored"),
    ("CategoryCreated", "CategoryCreated"),
    ("CategoryUpdated", "CategoryUpdated"),
    ("CategorySoftDeleted", "CategoryDeleted"),
    ("CategoryRestored", "CategoryRestored"),
];

/// The notification type for a stored event type, resolving aliases.
pub fn notification_type_for(event_type: &str) -> Option<&'static str> {
    let canonical = canonical_event_type(event_type);
    NOTIFICATION_TYPES
        .iter()
        .find(|(stored, _)| *stored == canonical)
        .map(|(_, outward)| *outward)
}

/// Builds notifications from committed envelopes.
#[derive(Clone)]
pub struct NotificationMapper {
    settings: Arc<CatalogSettings>,
}

impl NotificationMapper {
    pub fn new(settings: Arc<CatalogSettings>) -> Self {
        Self { settings }
    }

    pub fn map(&self, envelope: &EventEnvelope) -> Option<Notification> {
        let notification_type = notification_type_for(&envelope.event_type)?;

        Some(Notification {
            notification_type: notification_type.to_string(),
            entity_id: Some(envelope.aggregate_id),
            event_id: Some(envelope.event_id),
            version: Some(envelope.version.as_i64()),
            timestamp: envelope.timestamp,
            display: self.display_text(envelope),
        })
    }

    /// Title or name in the default locale, for events that set one.
    ///
    /// A payload that fails to decode still yields a notification, just
    /// without display text.
    fn display_text(&self, envelope: &EventEnvelope) -> Option<String> {
        let locale = self.settings.default_locale();
        match envelope.aggregate_type.as_str() {
            "Book" => decode_event::<Book>(envelope)
                .ok()?
                .title()
                .and_then(|t| t.get(locale).map(str::to_string)),
            "Author" => decode_event::<Author>(envelope)
                .ok()?
                .name()
                .map(str::to_string),
            "Publisher" => decode_event::<Publisher>(envelope)
                .ok()?
                .name()
                .map(str::to_string),
            "Category" => decode_event::<Category>(envelope)
                .ok()?
                .name()
                .and_then(|t| t.get(locale).map(str::to_string)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{AggregateId, Locale};
    use domain::author::AuthorCreatedData;
    use domain::book::BookSoftDeletedData;
    use domain::{AuthorEvent, BookEvent, DomainEvent, Translations};
    use event_store::Version;

    fn envelope<E: DomainEvent + serde::Serialize>(aggregate_type: &str, event: &E) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(AggregateId::new())
            .aggregate_type(aggregate_type)
            .event_type(event.event_type())
            .version(Version::new(2))
            .payload(event)
            .unwrap()
            .build()
    }

    fn mapper() -> NotificationMapper {
        NotificationMapper::new(Arc::new(CatalogSettings::default()))
    }

    #[test]
    fn soft_deletes_become_deleted() {
        assert_eq!(notification_type_for("BookSoftDeleted"), Some("BookDeleted"));
        assert_eq!(notification_type_for("AuthorSoftDeleted"), Some("AuthorDeleted"));
        assert_eq!(notification_type_for("PublisherSoftDeleted"), Some("PublisherDeleted"));
        assert_eq!(notification_type_for("CategorySoftDeleted"), Some("CategoryDeleted"));
    }

    #[test]
    fn sale_events_collapse_into_one_type() {
        assert_eq!(notification_type_for("BookSaleScheduled"), Some("BookSaleChanged"));
        assert_eq!(notification_type_for("BookSaleCancelled"), Some("BookSaleChanged"));
    }

    #[test]
    fn aliases_resolve_and_unknown_types_map_to_none() {
        assert_eq!(notification_type_for("BookDeleted"), Some("BookDeleted"));
        assert_eq!(notification_type_for("BookArchived"), None);
    }

    #[test]
    fn carries_identity_and_display_name() {
        let event = AuthorEvent::AuthorCreated(AuthorCreatedData {
            author_id: AggregateId::new(),
            name: "Ted Chiang".into(),
            biography: Translations::new().with(Locale::parse("en").unwrap(), "long text"),
            created_at: Utc::now(),
        });
        let env = envelope("Author", &event);

        let n = mapper().map(&env).unwrap();

        assert_eq!(n.notification_type, "AuthorCreated");
        assert_eq!(n.entity_id, Some(env.aggregate_id));
        assert_eq!(n.event_id, Some(env.event_id));
        assert_eq!(n.version, Some(2));
        assert_eq!(n.display.as_deref(), Some("Ted Chiang"));
    }

    #[test]
    fn events_without_names_have_no_display() {
        let event = BookEvent::BookSoftDeleted(BookSoftDeletedData {
            deleted_at: Utc::now(),
        });

        let n = mapper().map(&envelope("Book", &event)).unwrap();

        assert_eq!(n.notification_type, "BookDeleted");
        assert!(n.display.is_none());
    }

    #[test]
    fn unknown_event_types_produce_nothing() {
        let env = EventEnvelope::builder()
            .aggregate_id(AggregateId::new())
            .aggregate_type("Book")
            .event_type("BookArchived")
            .version(Version::new(1))
            .payload_raw(serde_json::json!({}))
            .build();

        assert!(mapper().map(&env).is_none());
    }
}
