//! Publisher aggregate and related types.

mod aggregate;
mod events;
mod service;

pub use aggregate::{
    CreatePublisher, Publisher, RestorePublisher, SoftDeletePublisher, UpdatePublisher,
};
pub use events::{
    PublisherCreatedData, PublisherEvent, PublisherRestoredData, PublisherSoftDeletedData,
    PublisherUpdatedData,
};
pub use service::PublisherService;

use thiserror::Error;

use crate::error::{ErrorKind, ValidationError};

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Publisher already created")]
    AlreadyCreated,

    #[error("entity deleted")]
    Deleted,

    #[error("Publisher is not deleted")]
    NotDeleted,
}

impl PublisherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PublisherError::Invalid(_) => ErrorKind::Validation,
            _ => ErrorKind::Domain,
        }
    }
}
