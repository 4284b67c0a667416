//! Directory read model: authors, publishers and categories.
//!
//! Besides serving list and detail queries, the directory is the lookup the
//! book search view uses to denormalize names at apply time.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, CatalogSettings, Locale};
use domain::{
    Author, AuthorEvent, BookReferences, Category, CategoryEvent, Lifecycle, Publisher,
    PublisherEvent, Translations, decode_event,
};
use event_store::{EventEnvelope, Version};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, VersionCheck, check_version};
use crate::read_model::ReadModel;

const NAME: &str = "DirectoryView";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorDocument {
    pub id: AggregateId,
    pub name: String,
    pub biography: Translations,
    pub lifecycle: Lifecycle,
    pub version: Version,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherDocument {
    pub id: AggregateId,
    pub name: String,
    pub lifecycle: Lifecycle,
    pub version: Version,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDocument {
    pub id: AggregateId,
    pub name: Translations,
    pub lifecycle: Lifecycle,
    pub version: Version,
    pub updated_at: DateTime<Utc>,
}

/// A referenced entity with its name as known at lookup time.
///
/// `name` is None when the directory has never seen the entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: AggregateId,
    pub name: Option<String>,
}

/// A referenced category with its translated name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: AggregateId,
    pub name: Translations,
}

/// Names resolved for one book's references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNames {
    pub publisher: Option<NamedRef>,
    pub authors: Vec<NamedRef>,
    pub categories: Vec<CategoryRef>,
}

#[derive(Default)]
struct DirectoryState {
    authors: HashMap<AggregateId, AuthorDocument>,
    publishers: HashMap<AggregateId, PublisherDocument>,
    categories: HashMap<AggregateId, CategoryDocument>,
    position: ProjectionPosition,
}

/// Synchronous read model for the book-adjacent entities.
#[derive(Clone)]
pub struct DirectoryView {
    state: Arc<RwLock<DirectoryState>>,
    settings: Arc<CatalogSettings>,
}

impl DirectoryView {
    pub fn new(settings: Arc<CatalogSettings>) -> Self {
        Self {
            state: Arc::new(RwLock::new(DirectoryState::default())),
            settings,
        }
    }

    pub async fn get_author(&self, id: AggregateId) -> Option<AuthorDocument> {
        self.state.read().await.authors.get(&id).cloned()
    }

    pub async fn get_publisher(&self, id: AggregateId) -> Option<PublisherDocument> {
        self.state.read().await.publishers.get(&id).cloned()
    }

    pub async fn get_category(&self, id: AggregateId) -> Option<CategoryDocument> {
        self.state.read().await.categories.get(&id).cloned()
    }

    /// Authors ordered by name.
    pub async fn list_authors(&self, include_deleted: bool) -> Vec<AuthorDocument> {
        let state = self.state.read().await;
        let mut authors: Vec<_> = state
            .authors
            .values()
            .filter(|a| include_deleted || !a.lifecycle.is_deleted())
            .cloned()
            .collect();
        authors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        authors
    }

    /// Publishers ordered by name.
    pub async fn list_publishers(&self, include_deleted: bool) -> Vec<PublisherDocument> {
        let state = self.state.read().await;
        let mut publishers: Vec<_> = state
            .publishers
            .values()
            .filter(|p| include_deleted || !p.lifecycle.is_deleted())
            .cloned()
            .collect();
        publishers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        publishers
    }

    /// Categories ordered by their name in `locale`, falling back to the
    /// default locale.
    pub async fn list_categories(
        &self,
        include_deleted: bool,
        locale: &Locale,
    ) -> Vec<CategoryDocument> {
        let default_locale = self.settings.default_locale();
        let state = self.state.read().await;
        let mut categories: Vec<_> = state
            .categories
            .values()
            .filter(|c| include_deleted || !c.lifecycle.is_deleted())
            .cloned()
            .collect();
        categories.sort_by(|a, b| {
            let a_name = a.name.resolve(locale, default_locale).unwrap_or_default();
            let b_name = b.name.resolve(locale, default_locale).unwrap_or_default();
            a_name.cmp(b_name).then(a.id.cmp(&b.id))
        });
        categories
    }

    /// Resolves the names of everything a book references, in one read.
    pub async fn resolve(&self, references: &BookReferences) -> ResolvedNames {
        let state = self.state.read().await;
        ResolvedNames {
            publisher: references.publisher_id.map(|id| NamedRef {
                id,
                name: state.publishers.get(&id).map(|p| p.name.clone()),
            }),
            authors: references
                .author_ids
                .iter()
                .map(|&id| NamedRef {
                    id,
                    name: state.authors.get(&id).map(|a| a.name.clone()),
                })
                .collect(),
            categories: references
                .category_ids
                .iter()
                .map(|&id| CategoryRef {
                    id,
                    name: state
                        .categories
                        .get(&id)
                        .map(|c| c.name.clone())
                        .unwrap_or_default(),
                })
                .collect(),
        }
    }

    fn apply_author(state: &mut DirectoryState, event: &EventEnvelope) -> Result<()> {
        let id = event.aggregate_id;
        let current = state.authors.get(&id).map(|d| d.version).unwrap_or_default();
        if check_version(NAME, current, event)? == VersionCheck::Skip {
            return Ok(());
        }

        let event_data = decode_event::<Author>(event)?;
        if let AuthorEvent::AuthorCreated(data) = &event_data {
            state.authors.insert(
                id,
                AuthorDocument {
                    id,
                    name: data.name.clone(),
                    biography: data.biography.clone(),
                    lifecycle: Lifecycle::Active,
                    version: event.version,
                    updated_at: Utc::now(),
                },
            );
            return Ok(());
        }

        let Some(doc) = state.authors.get_mut(&id) else {
            return Ok(());
        };
        match event_data {
            AuthorEvent::AuthorCreated(_) => {}
            AuthorEvent::AuthorUpdated(data) => {
                doc.name = data.name;
                doc.biography = data.biography;
            }
            AuthorEvent::AuthorSoftDeleted(_) => doc.lifecycle = Lifecycle::Deleted,
            AuthorEvent::AuthorRestored(_) => doc.lifecycle = Lifecycle::Active,
        }
        doc.version = event.version;
        doc.updated_at = Utc::now();
        Ok(())
    }

    fn apply_publisher(state: &mut DirectoryState, event: &EventEnvelope) -> Result<()> {
        let id = event.aggregate_id;
        let current = state
            .publishers
            .get(&id)
            .map(|d| d.version)
            .unwrap_or_default();
        if check_version(NAME, current, event)? == VersionCheck::Skip {
            return Ok(());
        }

        let event_data = decode_event::<Publisher>(event)?;
        if let PublisherEvent::PublisherCreated(data) = &event_data {
            state.publishers.insert(
                id,
                PublisherDocument {
                    id,
                    name: data.name.clone(),
                    lifecycle: Lifecycle::Active,
                    version: event.version,
                    updated_at: Utc::now(),
                },
            );
            return Ok(());
        }

        let Some(doc) = state.publishers.get_mut(&id) else {
            return Ok(());
        };
        match event_data {
            PublisherEvent::PublisherCreated(_) => {}
            PublisherEvent::PublisherUpdated(data) => doc.name = data.name,
            PublisherEvent::PublisherSoftDeleted(_) => doc.lifecycle = Lifecycle::Deleted,
            PublisherEvent::PublisherRestored(_) => doc.lifecycle = Lifecycle::Active,
        }
        doc.version = event.version;
        doc.updated_at = Utc::now();
        Ok(())
    }

    fn apply_category(state: &mut DirectoryState, event: &EventEnvelope) -> Result<()> {
        let id = event.aggregate_id;
        let current = state
            .categories
            .get(&id)
            .map(|d| d.version)
            .unwrap_or_default();
        if check_version(NAME, current, event)? == VersionCheck::Skip {
            return Ok(());
        }

        let event_data = decode_event::<Category>(event)?;
        if let CategoryEvent::CategoryCreated(data) = &event_data {
            state.categories.insert(
                id,
                CategoryDocument {
                    id,
                    name: data.name.clone(),
                    lifecycle: Lifecycle::Active,
                    version: event.version,
                    updated_at: Utc::now(),
                },
            );
            return Ok(());
        }

        let Some(doc) = state.categories.get_mut(&id) else {
            return Ok(());
        };
        match event_data {
            CategoryEvent::CategoryCreated(_) => {}
            CategoryEvent::CategoryUpdated(data) => doc.name = data.name,
            CategoryEvent::CategorySoftDeleted(_) => doc.lifecycle = Lifecycle::Deleted,
            CategoryEvent::CategoryRestored(_) => doc.lifecycle = Lifecycle::Active,
        }
        doc.version = event.version;
        doc.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl Projection for DirectoryView {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let mut state = self.state.write().await;

        let outcome = match event.aggregate_type.as_str() {
            "Author" => Self::apply_author(&mut state, event),
            "Publisher" => Self::apply_publisher(&mut state, event),
            "Category" => Self::apply_category(&mut state, event),
            _ => Ok(()),
        };

        state.position = state.position.advance();
        outcome
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        *state = DirectoryState::default();
        Ok(())
    }
}

impl ReadModel for DirectoryView {
    fn name(&self) -> &'static str {
        NAME
    }

    fn count(&self) -> usize {
        self.state
            .try_read()
            .map(|s| s.authors.len() + s.publishers.len() + s.categories.len())
            .unwrap_or(0)
    }
}
