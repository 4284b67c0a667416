//! Book commands.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use common::AggregateId;

use crate::command::Command;
use crate::value_objects::{Prices, Translations};

use super::Book;

/// Editable book fields, as submitted by a caller.
///
/// Nothing here is validated yet; the aggregate checks it against the
/// catalog settings before emitting an event.
#[derive(Debug, Clone, Default)]
pub struct BookDetails {
    pub title: Translations,
    pub description: Translations,
    pub isbn: String,
    pub publisher_id: Option<AggregateId>,
    pub author_ids: BTreeSet<AggregateId>,
    pub category_ids: BTreeSet<AggregateId>,
    pub prices: Prices,
}

#[derive(Debug, Clone)]
pub struct CreateBook {
    pub book_id: AggregateId,
    pub details: BookDetails,
}

impl CreateBook {
    /// Creates a command with a freshly generated book id.
    pub fn new(details: BookDetails) -> Self {
        Self {
            book_id: AggregateId::new(),
            details,
        }
    }
}

/// Replaces every editable field, including the reference sets.
#[derive(Debug, Clone)]
pub struct UpdateBook {
    pub book_id: AggregateId,
    pub details: BookDetails,
}

#[derive(Debug, Clone)]
pub struct SoftDeleteBook {
    pub book_id: AggregateId,
}

#[derive(Debug, Clone)]
pub struct RestoreBook {
    pub book_id: AggregateId,
}

#[derive(Debug, Clone)]
pub struct ScheduleSale {
    pub book_id: AggregateId,
    pub discount_percent: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CancelSale {
    pub book_id: AggregateId,
}

#[derive(Debug, Clone)]
pub struct UpdateCover {
    pub book_id: AggregateId,
    pub blob_key: String,
    pub content_type: String,
}

macro_rules! book_command {
    ($($command:ty),* $(,)?) => {
        $(
            impl Command for $command {
                type Aggregate = Book;

                fn aggregate_id(&self) -> AggregateId {
                    self.book_id
                }
            }
        )*
    };
}

book_command!(
    CreateBook,
    UpdateBook,
    SoftDeleteBook,
    RestoreBook,
    ScheduleSale,
    CancelSale,
    UpdateCover,
);
