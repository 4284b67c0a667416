//! Publisher service.

use common::AggregateId;
use event_store::{ETag, EventStore};

use crate::aggregate::Aggregate;
use crate::command::{CommandContext, CommandHandler, CommandResult};
use crate::error::DomainError;

use super::{
    CreatePublisher, Publisher, PublisherError, RestorePublisher, SoftDeletePublisher,
    UpdatePublisher,
};

impl From<PublisherError> for DomainError {
    fn from(e: PublisherError) -> Self {
        DomainError::Publisher(e)
    }
}

pub struct PublisherService<S: EventStore> {
    handler: CommandHandler<S, Publisher>,
}

impl<S: EventStore> PublisherService<S> {
    pub fn new(store: S) -> Self {
        Self {
            handler: CommandHandler::new(store),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_publisher(
        &self,
        cmd: CreatePublisher,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Publisher>, DomainError> {
        self.handler
            .create(cmd.publisher_id, ctx, |publisher| publisher.create(&cmd))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_publisher(
        &self,
        cmd: UpdatePublisher,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Publisher>, DomainError> {
        self.handler
            .execute(cmd.publisher_id, ctx, |publisher| publisher.update(&cmd))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn soft_delete_publisher(
        &self,
        cmd: SoftDeletePublisher,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Publisher>, DomainError> {
        self.handler
            .execute(cmd.publisher_id, ctx, |publisher| publisher.soft_delete())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn restore_publisher(
        &self,
        cmd: RestorePublisher,
        ctx: &CommandContext,
    ) -> Result<CommandResult<Publisher>, DomainError> {
        self.handler
            .execute(cmd.publisher_id, ctx, |publisher| publisher.restore())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_publisher(
        &self,
        publisher_id: AggregateId,
    ) -> Result<Option<(Publisher, ETag)>, DomainError> {
        Ok(self
            .handler
            .load_existing(publisher_id)
            .await?
            .map(|publisher| {
                let etag = ETag::from_version(publisher.version());
                (publisher, etag)
            }))
    }
}
