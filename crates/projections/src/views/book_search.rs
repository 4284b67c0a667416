//! Book search read model.
//!
//! One document per book with publisher, author and category names copied
//! from the directory when the book's own stream changes. A renamed author
//! shows up in a book document on the book's next event or on a rebuild.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, CatalogSettings, Locale};
use domain::{
    Book, BookEvent, BookReferences, CoverRef, Isbn, Lifecycle, Prices, Sale, Translations,
    decode_event,
};
use event_store::{EventEnvelope, Version};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, VersionCheck, check_version};
use crate::read_model::ReadModel;
use crate::views::directory::{CategoryRef, DirectoryView, NamedRef, ResolvedNames};

const NAME: &str = "BookSearchView";

/// Denormalized book document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDocument {
    pub id: AggregateId,
    pub title: Translations,
    pub description: Translations,
    pub isbn: Isbn,
    pub publisher: Option<NamedRef>,
    pub authors: Vec<NamedRef>,
    pub categories: Vec<CategoryRef>,
    pub prices: Prices,
    pub sale: Option<Sale>,
    pub cover: Option<CoverRef>,
    pub lifecycle: Lifecycle,
    pub version: Version,
    pub updated_at: DateTime<Utc>,
}

impl BookDocument {
    /// The ids this document points at.
    pub fn references(&self) -> BookReferences {
        BookReferences {
            publisher_id: self.publisher.as_ref().map(|p| p.id),
            author_ids: self.authors.iter().map(|a| a.id).collect(),
            category_ids: self.categories.iter().map(|c| c.id).collect(),
        }
    }

    fn set_names(&mut self, names: ResolvedNames) {
        self.publisher = names.publisher;
        self.authors = names.authors;
        self.categories = names.categories;
    }

    fn matches(&self, query: &BookQuery) -> bool {
        if !query.include_deleted && self.lifecycle.is_deleted() {
            return false;
        }
        if let Some(author_id) = query.author_id
            && !self.authors.iter().any(|a| a.id == author_id)
        {
            return false;
        }
        if let Some(category_id) = query.category_id
            && !self.categories.iter().any(|c| c.id == category_id)
        {
            return false;
        }
        if let Some(publisher_id) = query.publisher_id
            && self.publisher.as_ref().map(|p| p.id) != Some(publisher_id)
        {
            return false;
        }
        match query.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let needle = text.to_lowercase();
                self.title
                    .iter()
                    .any(|(_, t)| t.to_lowercase().contains(&needle))
                    || self.isbn.as_str() == needle.replace('-', "").to_uppercase()
                    || self.authors.iter().any(|a| {
                        a.name
                            .as_deref()
                            .is_some_and(|n| n.to_lowercase().contains(&needle))
                    })
            }
            _ => true,
        }
    }
}

/// Filters for [`BookSearchView::search`].
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    /// Matched case-insensitively against titles and author names, or
    /// exactly against the normalized ISBN.
    pub text: Option<String>,
    pub author_id: Option<AggregateId>,
    pub category_id: Option<AggregateId>,
    pub publisher_id: Option<AggregateId>,
    pub include_deleted: bool,
    /// Locale used to order results by title.
    pub locale: Option<Locale>,
    pub offset: usize,
    pub limit: Option<usize>,
}

struct BookSearchState {
    books: HashMap<AggregateId, BookDocument>,
    position: ProjectionPosition,
}

/// Synchronous book search view.
#[derive(Clone)]
pub struct BookSearchView {
    state: Arc<RwLock<BookSearchState>>,
    directory: DirectoryView,
    settings: Arc<CatalogSettings>,
}

impl BookSearchView {
    pub fn new(directory: DirectoryView, settings: Arc<CatalogSettings>) -> Self {
        Self {
            state: Arc::new(RwLock::new(BookSearchState {
                books: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
            directory,
            settings,
        }
    }

    pub async fn get(&self, id: AggregateId) -> Option<BookDocument> {
        self.state.read().await.books.get(&id).cloned()
    }

    /// Books matching the query, ordered by title then id.
    pub async fn search(&self, query: &BookQuery) -> Vec<BookDocument> {
        let default_locale = self.settings.default_locale();
        let locale = query.locale.as_ref().unwrap_or(default_locale);

        let state = self.state.read().await;
        let mut books: Vec<_> = state
            .books
            .values()
            .filter(|b| b.matches(query))
            .cloned()
            .collect();
        drop(state);

        books.sort_by(|a, b| {
            let a_title = a.title.resolve(locale, default_locale).unwrap_or_default();
            let b_title = b.title.resolve(locale, default_locale).unwrap_or_default();
            a_title.cmp(b_title).then(a.id.cmp(&b.id))
        });

        books
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect()
    }

    fn current_version(state: &BookSearchState, id: AggregateId) -> Version {
        state.books.get(&id).map(|d| d.version).unwrap_or_default()
    }
}

#[async_trait]
impl Projection for BookSearchView {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Book" {
            let mut state = self.state.write().await;
            state.position = state.position.advance();
            return Ok(());
        }

        let book_event = decode_event::<Book>(event)?;
        let id = event.aggregate_id;

        // Names are resolved before taking the write lock; the directory has
        // its own lock.
        let names = match book_event.references() {
            Some(references) => Some(self.directory.resolve(&references).await),
            None => None,
        };

        let mut state = self.state.write().await;
        state.position = state.position.advance();

        let current = Self::current_version(&state, id);
        if check_version(NAME, current, event)? == VersionCheck::Skip {
            return Ok(());
        }

        if let BookEvent::BookCreated(data) = book_event {
            let names = names.unwrap_or_default();
            state.books.insert(
                id,
                BookDocument {
                    id,
                    title: data.title,
                    description: data.description,
                    isbn: data.isbn,
                    publisher: names.publisher,
                    authors: names.authors,
                    categories: names.categories,
                    prices: data.prices,
                    sale: None,
                    cover: None,
                    lifecycle: Lifecycle::Active,
                    version: event.version,
                    updated_at: Utc::now(),
                },
            );
            return Ok(());
        }

        let Some(doc) = state.books.get_mut(&id) else {
            return Ok(());
        };

        match book_event {
            BookEvent::BookCreated(_) => {}
            BookEvent::BookUpdated(data) => {
                doc.title = data.title;
                doc.description = data.description;
                doc.isbn = data.isbn;
                doc.prices = data.prices;
                if let Some(names) = names {
                    doc.set_names(names);
                }
            }
            BookEvent::BookSoftDeleted(_) => doc.lifecycle = Lifecycle::Deleted,
            BookEvent::BookRestored(_) => doc.lifecycle = Lifecycle::Active,
            BookEvent::BookSaleScheduled(data) => doc.sale = Some(data.sale),
            BookEvent::BookSaleCancelled(_) => doc.sale = None,
            BookEvent::BookCoverUpdated(data) => doc.cover = Some(data.cover),
        }

        doc.version = event.version;
        doc.updated_at = Utc::now();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.books.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for BookSearchView {
    fn name(&self) -> &'static str {
        NAME
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.books.len()).unwrap_or(0)
    }
}
