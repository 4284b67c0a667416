//! Notification type → invalidation keys.

use std::collections::HashMap;

use crate::notification::Notification;

/// Placeholder replaced by the notification's entity id.
const ID_PLACEHOLDER: &str = "{id}";

/// Static map from notification types to the query scopes they make stale.
///
/// Templates may contain `{id}`; it is substituted with the entity id. A
/// template with `{id}` is dropped for notifications that carry no id.
#[derive(Debug, Clone, Default)]
pub struct InvalidationRegistry {
    rules: HashMap<String, Vec<String>>,
}

impl InvalidationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the templates for one notification type.
    pub fn with_rule<I, K>(mut self, notification_type: impl Into<String>, templates: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.rules.insert(
            notification_type.into(),
            templates.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// The rules for the catalog's notification types.
    pub fn catalog() -> Self {
        let book_change = ["Books", "Book:{id}", "Statistics"];
        let entity = |plural: &'static str, singular: &'static str| {
            [plural.to_string(), format!("{singular}:{ID_PLACEHOLDER}")]
        };

        Self::new()
            .with_rule("BookCreated", ["Books", "Statistics"])
            .with_rule("BookUpdated", book_change)
            .with_rule("BookDeleted", book_change)
            .with_rule("BookRestored", book_change)
            .with_rule("BookSaleChanged", ["Books", "Book:{id}"])
            .with_rule("BookCoverUpdated", ["Books", "Book:{id}"])
            .with_rule("AuthorCreated", ["Authors"])
            .with_rule("AuthorUpdated", entity("Authors", "Author"))
            .with_rule("AuthorDeleted", entity("Authors", "Author"))
            .with_rule("AuthorRestored", entity("Authors", "Author"))
            .with_rule("PublisherCreated", ["Publishers"])
            .with_rule("PublisherUpdated", entity("Publishers", "Publisher"))
            .with_rule("PublisherDeleted", entity("Publishers", "Publisher"))
            .with_rule("PublisherRestored", entity("Publishers", "Publisher"))
            .with_rule("CategoryCreated", ["Categories"])
            .with_rule("CategoryUpdated", entity("Categories", "Category"))
            .with_rule("CategoryDeleted", entity("Categories", "Category"))
            .with_rule("CategoryRestored", entity("Categories", "Category"))
    }

    /// The concrete keys a notification invalidates.
    pub fn keys_for(&self, notification: &Notification) -> Vec<String> {
        let Some(templates) = self.rules.get(&notification.notification_type) else {
            return Vec::new();
        };

        templates
            .iter()
            .filter_map(|template| {
                if !template.contains(ID_PLACEHOLDER) {
                    return Some(template.clone());
                }
                notification
                    .entity_id
                    .map(|id| template.replace(ID_PLACEHOLDER, &id.to_string()))
            })
            .collect()
    }

    /// The raw templates for a notification type.
    pub fn templates(&self, notification_type: &str) -> &[String] {
        self.rules
            .get(notification_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
