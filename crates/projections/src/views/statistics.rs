//! Book statistics read model.
//!
//! Counts active books per author, per category and per publisher. The
//! counters are only ever adjusted against this view's own membership
//! table, which is updated under the same lock, so a lagging sibling
//! projection can never cause double counting.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use domain::{Book, BookEvent, BookReferences, decode_event};
use event_store::{EventEnvelope, Version};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, VersionCheck, check_version};
use crate::read_model::ReadModel;

const NAME: &str = "BookStatisticsView";

/// Which counter family a referenced id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Author,
    Category,
    Publisher,
}

/// Active book count for one referenced entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceStatistics {
    pub kind: ReferenceKind,
    pub id: AggregateId,
    pub active_books: u64,
}

#[derive(Debug, Clone)]
struct Membership {
    references: BookReferences,
    active: bool,
    version: Version,
}

#[derive(Default)]
struct StatisticsState {
    counts: HashMap<(ReferenceKind, AggregateId), u64>,
    memberships: HashMap<AggregateId, Membership>,
    position: ProjectionPosition,
}

impl StatisticsState {
    fn adjust(&mut self, kind: ReferenceKind, id: AggregateId, increment: bool) {
        let key = (kind, id);
        if increment {
            *self.counts.entry(key).or_insert(0) += 1;
        } else if let Some(count) = self.counts.get_mut(&key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&key);
            }
        }
    }

    fn adjust_all(&mut self, references: &BookReferences, increment: bool) {
        for &id in &references.author_ids {
            self.adjust(ReferenceKind::Author, id, increment);
        }
        for &id in &references.category_ids {
            self.adjust(ReferenceKind::Category, id, increment);
        }
        if let Some(id) = references.publisher_id {
            self.adjust(ReferenceKind::Publisher, id, increment);
        }
    }

    fn adjust_diff(
        &mut self,
        kind: ReferenceKind,
        previous: &BTreeSet<AggregateId>,
        next: &BTreeSet<AggregateId>,
    ) {
        for &id in previous.difference(next) {
            self.adjust(kind, id, false);
        }
        for &id in next.difference(previous) {
            self.adjust(kind, id, true);
        }
    }

    fn apply_update(&mut self, previous: &BookReferences, next: &BookReferences) {
        self.adjust_diff(ReferenceKind::Author, &previous.author_ids, &next.author_ids);
        self.adjust_diff(
            ReferenceKind::Category,
            &previous.category_ids,
            &next.category_ids,
        );
        let to_set = |id: Option<AggregateId>| id.into_iter().collect::<BTreeSet<_>>();
        self.adjust_diff(
            ReferenceKind::Publisher,
            &to_set(previous.publisher_id),
            &to_set(next.publisher_id),
        );
    }
}

/// Asynchronous cross-stream statistics view.
#[derive(Clone, Default)]
pub struct BookStatisticsView {
    state: Arc<RwLock<StatisticsState>>,
}

impl BookStatisticsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn active_books(&self, kind: ReferenceKind, id: AggregateId) -> u64 {
        self.state
            .read()
            .await
            .counts
            .get(&(kind, id))
            .copied()
            .unwrap_or(0)
    }

    pub async fn statistics(&self, kind: ReferenceKind, id: AggregateId) -> ReferenceStatistics {
        ReferenceStatistics {
            kind,
            id,
            active_books: self.active_books(kind, id).await,
        }
    }

    /// Every non-zero counter, ordered by kind then id.
    pub async fn all(&self) -> Vec<ReferenceStatistics> {
        let state = self.state.read().await;
        let mut stats: Vec<_> = state
            .counts
            .iter()
            .map(|(&(kind, id), &active_books)| ReferenceStatistics {
                kind,
                id,
                active_books,
            })
            .collect();
        stats.sort_by_key(|s| (s.kind as u8, s.id));
        stats
    }
}

#[async_trait]
impl Projection for BookStatisticsView {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let mut state = self.state.write().await;
        state.position = state.position.advance();

        if event.aggregate_type != "Book" {
            return Ok(());
        }

        let book_id = event.aggregate_id;
        let current = state
            .memberships
            .get(&book_id)
            .map(|m| m.version)
            .unwrap_or_default();
        if check_version(NAME, current, event)? == VersionCheck::Skip {
            return Ok(());
        }

        let book_event = decode_event::<Book>(event)?;
        let next = book_event.references().unwrap_or_default();
        let previous = state.memberships.remove(&book_id);

        let membership = match (book_event, previous) {
            (BookEvent::BookCreated(_), _) | (BookEvent::BookUpdated(_), None) => {
                let references = next;
                state.adjust_all(&references, true);
                Membership {
                    references,
                    active: true,
                    version: event.version,
                }
            }
            (BookEvent::BookUpdated(_), Some(mut membership)) => {
                if membership.active {
                    state.apply_update(&membership.references, &next);
                }
                membership.references = next;
                membership.version = event.version;
                membership
            }
            (BookEvent::BookSoftDeleted(_), Some(mut membership)) => {
                if membership.active {
                    state.adjust_all(&membership.references, false);
                    membership.active = false;
                }
                membership.version = event.version;
                membership
            }
            (BookEvent::BookRestored(_), Some(mut membership)) => {
                if !membership.active {
                    state.adjust_all(&membership.references, true);
                    membership.active = true;
                }
                membership.version = event.version;
                membership
            }
            (_, Some(mut membership)) => {
                membership.version = event.version;
                membership
            }
            (_, None) => Membership {
                references: BookReferences::default(),
                active: false,
                version: event.version,
            },
        };

        state.memberships.insert(book_id, membership);
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = StatisticsState::default();
        Ok(())
    }
}

impl ReadModel for BookStatisticsView {
    fn name(&self) -> &'static str {
        NAME
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.counts.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProjectionError;
    use crate::fixtures::{book_created, book_deleted, book_restored, book_updated};

    async fn apply_all(view: &BookStatisticsView, events: &[EventEnvelope]) {
        for event in events {
            view.handle(event).await.unwrap();
        }
    }

    #[tokio::test]
    async fn creation_counts_every_reference() {
        let view = BookStatisticsView::new();
        let (book, author, category, publisher) = (
            AggregateId::new(),
            AggregateId::new(),
            AggregateId::new(),
            AggregateId::new(),
        );

        view.handle(&book_created(book, "Dune", Some(publisher), &[author], &[category]))
            .await
            .unwrap();

        assert_eq!(view.active_books(ReferenceKind::Author, author).await, 1);
        assert_eq!(view.active_books(ReferenceKind::Category, category).await, 1);
        assert_eq!(view.active_books(ReferenceKind::Publisher, publisher).await, 1);
    }

    #[tokio::test]
    async fn dropping_and_readding_an_author_moves_by_exactly_one() {
        let view = BookStatisticsView::new();
        let (book, a, b) = (AggregateId::new(), AggregateId::new(), AggregateId::new());

        apply_all(
            &view,
            &[
                book_created(book, "Dune", None, &[a, b], &[]),
                book_updated(book, 2, "Dune", None, &[b], &[]),
            ],
        )
        .await;
        assert_eq!(view.active_books(ReferenceKind::Author, a).await, 0);
        assert_eq!(view.active_books(ReferenceKind::Author, b).await, 1);

        view.handle(&book_updated(book, 3, "Dune", None, &[a, b], &[]))
            .await
            .unwrap();
        assert_eq!(view.active_books(ReferenceKind::Author, a).await, 1);
        assert_eq!(view.active_books(ReferenceKind::Author, b).await, 1);
    }

    #[tokio::test]
    async fn rapid_updates_do_not_double_count() {
        let view = BookStatisticsView::new();
        let (book, a, b, c) = (
            AggregateId::new(),
            AggregateId::new(),
            AggregateId::new(),
            AggregateId::new(),
        );

        apply_all(
            &view,
            &[
                book_created(book, "Dune", None, &[a], &[]),
                book_updated(book, 2, "Dune", None, &[a, b], &[]),
                book_updated(book, 3, "Dune", None, &[a, b, c], &[]),
            ],
        )
        .await;

        for author in [a, b, c] {
            assert_eq!(view.active_books(ReferenceKind::Author, author).await, 1);
        }
    }

    #[tokio::test]
    async fn publisher_change_moves_the_count() {
        let view = BookStatisticsView::new();
        let (book, p1, p2) = (AggregateId::new(), AggregateId::new(), AggregateId::new());

        apply_all(
            &view,
            &[
                book_created(book, "Dune", Some(p1), &[], &[]),
                book_updated(book, 2, "Dune", Some(p2), &[], &[]),
            ],
        )
        .await;

        assert_eq!(view.active_books(ReferenceKind::Publisher, p1).await, 0);
        assert_eq!(view.active_books(ReferenceKind::Publisher, p2).await, 1);
    }

    #[tokio::test]
    async fn soft_delete_and_restore_toggle_every_reference() {
        let view = BookStatisticsView::new();
        let (book, author, category) = (AggregateId::new(), AggregateId::new(), AggregateId::new());

        apply_all(
            &view,
            &[
                book_created(book, "Dune", None, &[author], &[category]),
                book_deleted(book, 2),
            ],
        )
        .await;
        assert_eq!(view.active_books(ReferenceKind::Author, author).await, 0);
        assert_eq!(view.active_books(ReferenceKind::Category, category).await, 0);

        view.handle(&book_restored(book, 3)).await.unwrap();
        assert_eq!(view.active_books(ReferenceKind::Author, author).await, 1);
        assert_eq!(view.active_books(ReferenceKind::Category, category).await, 1);
    }

    #[tokio::test]
    async fn redelivered_events_are_ignored() {
        let view = BookStatisticsView::new();
        let (book, author) = (AggregateId::new(), AggregateId::new());
        let created = book_created(book, "Dune", None, &[author], &[]);

        apply_all(&view, &[created.clone(), created]).await;

        assert_eq!(view.active_books(ReferenceKind::Author, author).await, 1);
    }

    #[tokio::test]
    async fn version_gaps_are_rejected_without_side_effects() {
        let view = BookStatisticsView::new();
        let (book, a, b) = (AggregateId::new(), AggregateId::new(), AggregateId::new());

        view.handle(&book_created(book, "Dune", None, &[a], &[]))
            .await
            .unwrap();
        let err = view
            .handle(&book_updated(book, 3, "Dune", None, &[b], &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, ProjectionError::OutOfOrder { expected: 2, actual: 3, .. }));
        assert_eq!(view.active_books(ReferenceKind::Author, a).await, 1);
        assert_eq!(view.active_books(ReferenceKind::Author, b).await, 0);
    }

    #[tokio::test]
    async fn reset_clears_counters() {
        let view = BookStatisticsView::new();
        let author = AggregateId::new();
        view.handle(&book_created(AggregateId::new(), "Dune", None, &[author], &[]))
            .await
            .unwrap();

        view.reset().await.unwrap();

        assert!(view.all().await.is_empty());
        assert_eq!(view.position().await, ProjectionPosition::zero());
    }
}
