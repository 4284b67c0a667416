//! Book service providing a simplified API for book operations.

use std::sync::Arc;

use common::{AggregateId, CatalogSettings};
use event_store::{ETag, EventEnvelope, EventStore};

use crate::aggregate::Aggregate;
use crate::command::{CommandContext, CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{
    Book, BookError, CancelSale, CreateBook, RestoreBook, ScheduleSale, SoftDeleteBook,
    UpdateBook, UpdateCover,
};

impl From<BookError> for DomainError {
    fn from(e: BookError) -> Self {
        DomainError::Book(e)
    }
}

/// Service for managing books.
///
/// Wraps the command handler and carries the catalog settings every
/// validating behavior needs.
pub struct BookService<S: EventStore> {
    handler: CommandHandler<S, Book>,
    settings: Arc<CatalogSettings>,
}

impl<S: EventStore> BookService<S> {
    pub fn new(store: S, settings: Arc<CatalogSettings>) -> Self {
        Self {
            handler: CommandHandler::new(store),
            settings,
        }
    }

    pub fn handler(&self) -> &CommandHandler<S, Book> {
        &self.handler
    }

    #[tracing::instrument(skip(self, cmd), fields(book_id = %cmd.book_id))]
    pub async fn create_book(
        &self,
        cmd: CreateBook,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Book>, DomainError> {
        let settings = &self.settings;
        self.handler
            .create(cmd.book_id, ctx, |book| book.create(&cmd, settings))
            .await
    }

    #[tracing::instrument(skip(self, cmd), fields(book_id = %cmd.book_id))]
    pub async fn update_book(
        &self,
        cmd: UpdateBook,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Book>, DomainError> {
        let settings = &self.settings;
        self.handler
            .execute(cmd.book_id, ctx, |book| book.update(&cmd, settings))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn soft_delete_book(
        &self,
        cmd: SoftDeleteBook,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Book>, DomainError> {
        self.handler
            .execute(cmd.book_id, ctx, |book| book.soft_delete())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn restore_book(
        &self,
        cmd: RestoreBook,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Book>, DomainError> {
        self.handler
            .execute(cmd.book_id, ctx, |book| book.restore())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn schedule_sale(
        &self,
        cmd: ScheduleSale,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Book>, DomainError> {
        self.handler
            .execute(cmd.book_id, ctx, |book| book.schedule_sale(&cmd))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel_sale(
        &self,
        cmd: CancelSale,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Book>, DomainError> {
        self.handler
            .execute(cmd.book_id, ctx, |book| book.cancel_sale())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_cover(
        &self,
        cmd: UpdateCover,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Book>, DomainError> {
        self.handler
            .execute(cmd.book_id, ctx, |book| book.update_cover(&cmd))
            .await
    }

    /// Loads a book by ID together with its current entity tag.
    ///
    /// Returns None if the book doesn't exist. Deleted books are returned;
    /// callers decide whether to hide them.
    #[tracing::instrument(skip(self))]
    pub async fn get_book(&self, book_id: AggregateId) -> Result<Option<(Book, ETag)>, DomainError> {
        Ok(self
            .handler
            .load_existing(book_id)
            .await?
            .map(|book| {
                let etag = ETag::from_version(book.version());
                (book, etag)
            }))
    }

    /// The raw event history of a book, oldest first.
    pub async fn book_history(&self, book_id: AggregateId) -> Result<Vec<EventEnvelope>, DomainError> {
        Ok(self.handler.store().get_events_for_aggregate(book_id).await?)
    }
}
