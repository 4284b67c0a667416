//! Category service.

use std::sync::Arc;

use common::{AggregateId, CatalogSettings};
use event_store::{ETag, EventStore};

use crate::aggregate::Aggregate;
use crate::command::{CommandContext, CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{
    Category, CategoryError, CreateCategory, RestoreCategory, SoftDeleteCategory, UpdateCategory,
};

impl From<CategoryError> for DomainError {
    fn from(e: CategoryError) -> Self {
        DomainError::Category(e)
    }
}

pub struct CategoryService<S: EventStore> {
    handler: CommandHandler<S, Category>,
    settings: Arc<CatalogSettings>,
}

impl<S: EventStore> CategoryService<S> {
    pub fn new(store: S, settings: Arc<CatalogSettings>) -> Self {
        Self {
            handler: CommandHandler::new(store),
            settings,
        }
    }

    #[tracing::instrument(skip(self, cmd), fields(category_id = %cmd.category_id))]
    pub async fn create_category(
        &self,
        cmd: CreateCategory,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Category>, DomainError> {
        let settings = &self.settings;
        self.handler
            .create(cmd.category_id, ctx, |category| category.create(&cmd, settings))
            .await
    }

    #[tracing::instrument(skip(self, cmd), fields(category_id = %cmd.category_id))]
    pub async fn update_category(
        &self,
        cmd: UpdateCategory,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Category>, DomainError> {
        let settings = &self.settings;
        self.handler
            .execute(cmd.category_id, ctx, |category| category.update(&cmd, settings))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn soft_delete_category(
        &self,
        cmd: SoftDeleteCategory,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Category>, DomainError> {
        self.handler
            .execute(cmd.category_id, ctx, |category| category.soft_delete())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn restore_category(
        &self,
        cmd: RestoreCategory,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Category>, DomainError> {
        self.handler
            .execute(cmd.category_id, ctx, |category| category.restore())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_category(
        &self,
        category_id: AggregateId,
    ) -> Result<Option<(Category, ETag)>, DomainError> {
        Ok(self
            .handler
            .load_existing(category_id)
            .await?
            .map(|category| {
                let etag = ETag::from_version(category.version());
                (category, etag)
            }))
    }
}
