//! Category aggregate and related types.

mod aggregate;
mod events;
mod service;

pub use aggregate::{
    Category, CreateCategory, RestoreCategory, SoftDeleteCategory, UpdateCategory,
};
pub use events::{
    CategoryCreatedData, CategoryEvent, CategoryRestoredData, CategorySoftDeletedData,
    CategoryUpdatedData,
};
pub use service::CategoryService;

use thiserror::Error;

use crate::error::{ErrorKind, ValidationError};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Category already created")]
    AlreadyCreated,

    #[error("entity deleted")]
    Deleted,

    #[error("Category is not deleted")]
    NotDeleted,
}

impl CategoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CategoryError::Invalid(_) => ErrorKind::Validation,
            _ => ErrorKind::Domain,
        }
    }
}
