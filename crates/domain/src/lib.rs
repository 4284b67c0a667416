//! Domain layer for the book catalog.
//!
//! This crate provides:
//! - `Aggregate` and `DomainEvent` traits for event-sourced entities
//! - the event registry used to decode stored events
//! - `CommandHandler`, which runs behaviors under the entity-tag protocol
//! - Book, Author, Publisher and Category aggregates with their services

pub mod aggregate;
pub mod author;
pub mod book;
pub mod category;
pub mod command;
pub mod error;
pub mod publisher;
pub mod registry;
pub mod value_objects;

pub use aggregate::{Aggregate, DomainEvent, Lifecycle};
pub use author::{
    Author, AuthorError, AuthorEvent, AuthorService, CreateAuthor, RestoreAuthor,
    SoftDeleteAuthor, UpdateAuthor,
};
pub use book::{
    Book, BookDetails, BookError, BookEvent, BookReferences, BookService, CancelSale, CreateBook,
    RestoreBook, ScheduleSale, SoftDeleteBook, UpdateBook, UpdateCover,
};
pub use category::{
    Category, CategoryError, CategoryEvent, CategoryService, CreateCategory, RestoreCategory,
    SoftDeleteCategory, UpdateCategory,
};
pub use command::{Command, CommandContext, CommandHandler, CommandResult};
pub use error::{DomainError, ErrorKind, ValidationError};
pub use publisher::{
    CreatePublisher, Publisher, PublisherError, PublisherEvent, PublisherService,
    RestorePublisher, SoftDeletePublisher, UpdatePublisher,
};
pub use registry::{canonical_event_type, decode_event};
pub use value_objects::{CoverRef, Isbn, Prices, Sale, Translations};
