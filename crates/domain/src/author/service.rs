//! Author service.

use std::sync::Arc;

use common::{AggregateId, CatalogSettings};
use event_store::{ETag, EventStore};

use crate::aggregate::Aggregate;
use crate::command::{CommandContext, CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{Author, AuthorError, CreateAuthor, RestoreAuthor, SoftDeleteAuthor, UpdateAuthor};

impl From<AuthorError> for DomainError {
    fn from(e: AuthorError) -> Self {
        DomainError::Author(e)
    }
}

pub struct AuthorService<S: EventStore> {
    handler: CommandHandler<S, Author>,
    settings: Arc<CatalogSettings>,
}

impl<S: EventStore> AuthorService<S> {
    pub fn new(store: S, settings: Arc<CatalogSettings>) -> Self {
        Self {
            handler: CommandHandler::new(store),
            settings,
        }
    }

    #[tracing::instrument(skip(self, cmd), fields(author_id = %cmd.author_id))]
    pub async fn create_author(
        &self,
        cmd: CreateAuthor,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Author>, DomainError> {
        let settings = &self.settings;
        self.handler
            .create(cmd.author_id, ctx, |author| author.create(&cmd, settings))
            .await
    }

    #[tracing::instrument(skip(self, cmd), fields(author_id = %cmd.author_id))]
    pub async fn update_author(
        &self,
        cmd: UpdateAuthor,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Author>, DomainError> {
        let settings = &self.settings;
        self.handler
            .execute(cmd.author_id, ctx, |author| author.update(&cmd, settings))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn soft_delete_author(
        &self,
        cmd: SoftDeleteAuthor,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Author>, DomainError> {
        self.handler
            .execute(cmd.author_id, ctx, |author| author.soft_delete())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn restore_author(
        &self,
        cmd: RestoreAuthor,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Author>, DomainError> {
        self.handler
            .execute(cmd.author_id, ctx, |author| author.restore())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_author(
        &self,
        author_id: AggregateId,
    ) -> Result<Option<(Author, ETag)>, DomainError> {
        Ok(self.handler.load_existing(author_id).await?.map(|author| {
            let etag = ETag::from_version(author.version());
            (author, etag)
        }))
    }
}
