//! Book aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;

pub use aggregate::Book;
pub use commands::*;
pub use events::{
    BookCoverUpdatedData, BookCreatedData, BookEvent, BookReferences, BookRestoredData,
    BookSaleCancelledData, BookSaleScheduledData, BookSoftDeletedData, BookUpdatedData,
};
pub use service::BookService;

use thiserror::Error;

use crate::error::{ErrorKind, ValidationError};

/// Errors that can occur during book operations.
#[derive(Debug, Error)]
pub enum BookError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Book already created")]
    AlreadyCreated,

    /// Every mutation except restore is refused on a deleted book.
    #[error("entity deleted")]
    Deleted,

    #[error("Book is not deleted")]
    NotDeleted,

    #[error("No sale is scheduled")]
    NoSaleScheduled,
}

impl BookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookError::Invalid(_) => ErrorKind::Validation,
            _ => ErrorKind::Domain,
        }
    }
}
