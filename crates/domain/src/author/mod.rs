//! Author aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;

pub use aggregate::Author;
pub use commands::*;
pub use events::{
    AuthorCreatedData, AuthorEvent, AuthorRestoredData, AuthorSoftDeletedData, AuthorUpdatedData,
};
pub use service::AuthorService;

use thiserror::Error;

use crate::error::{ErrorKind, ValidationError};

/// Errors that can occur during author operations.
#[derive(Debug, Error)]
pub enum AuthorError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Author already created")]
    AlreadyCreated,

    #[error("entity deleted")]
    Deleted,

    #[error("Author is not deleted")]
    NotDeleted,
}

impl AuthorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthorError::Invalid(_) => ErrorKind::Validation,
            _ => ErrorKind::Domain,
        }
    }
}
