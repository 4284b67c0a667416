//! Book aggregate implementation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use common::{AggregateId, CatalogSettings};
use event_store::Version;

use crate::aggregate::{Aggregate, Lifecycle};
use crate::value_objects::{
    CoverRef, Isbn, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS, Prices, Sale, Translations,
};

use super::{
    BookDetails, BookError, BookEvent, CreateBook, ScheduleSale, UpdateBook, UpdateCover,
    events::{
        BookCoverUpdatedData, BookCreatedData, BookRestoredData, BookSaleCancelledData,
        BookSaleScheduledData, BookSoftDeletedData, BookUpdatedData,
    },
};

/// Book aggregate root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Book {
    id: Option<AggregateId>,
    version: Version,
    lifecycle: Lifecycle,
    title: Translations,
    description: Translations,
    isbn: Option<Isbn>,
    publisher_id: Option<AggregateId>,
    author_ids: BTreeSet<AggregateId>,
    category_ids: BTreeSet<AggregateId>,
    prices: Prices,
    sale: Option<Sale>,
    cover: Option<CoverRef>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for Book {
    type Event = BookEvent;
    type Error = BookError;

    fn aggregate_type() -> &'static str {
        "Book"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            BookEvent::BookCreated(data) => {
                self.id = Some(data.book_id);
                self.lifecycle = Lifecycle::Active;
                self.title = data.title;
                self.description = data.description;
                self.isbn = Some(data.isbn);
                self.publisher_id = data.publisher_id;
                self.author_ids = data.author_ids;
                self.category_ids = data.category_ids;
                self.prices = data.prices;
                self.created_at = Some(data.created_at);
                self.updated_at = Some(data.created_at);
            }
            BookEvent::BookUpdated(data) => {
                self.title = data.title;
                self.description = data.description;
                self.isbn = Some(data.isbn);
                self.publisher_id = data.publisher_id;
                self.author_ids = data.author_ids;
                self.category_ids = data.category_ids;
                self.prices = data.prices;
                self.updated_at = Some(data.updated_at);
            }
            BookEvent::BookSoftDeleted(data) => {
                self.lifecycle = Lifecycle::Deleted;
                self.updated_at = Some(data.deleted_at);
            }
            BookEvent::BookRestored(data) => {
                self.lifecycle = Lifecycle::Active;
                self.updated_at = Some(data.restored_at);
            }
            BookEvent::BookSaleScheduled(data) => {
                self.sale = Some(data.sale);
                self.updated_at = Some(data.scheduled_at);
            }
            BookEvent::BookSaleCancelled(data) => {
                self.sale = None;
                self.updated_at = Some(data.cancelled_at);
            }
            BookEvent::BookCoverUpdated(data) => {
                self.cover = Some(data.cover);
                self.updated_at = Some(data.updated_at);
            }
        }
    }
}

// Query methods
impl Book {
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    pub fn title(&self) -> &Translations {
        &self.title
    }

    pub fn description(&self) -> &Translations {
        &self.description
    }

    pub fn isbn(&self) -> Option<&Isbn> {
        self.isbn.as_ref()
    }

    pub fn publisher_id(&self) -> Option<AggregateId> {
        self.publisher_id
    }

    pub fn author_ids(&self) -> &BTreeSet<AggregateId> {
        &self.author_ids
    }

    pub fn category_ids(&self) -> &BTreeSet<AggregateId> {
        &self.category_ids
    }

    pub fn prices(&self) -> &Prices {
        &self.prices
    }

    pub fn sale(&self) -> Option<&Sale> {
        self.sale.as_ref()
    }

    pub fn cover(&self) -> Option<&CoverRef> {
        self.cover.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

// Command methods (return events)
impl Book {
    pub fn create(
        &self,
        cmd: &CreateBook,
        settings: &CatalogSettings,
    ) -> Result<Vec<BookEvent>, BookError> {
        if self.id.is_some() {
            return Err(BookError::AlreadyCreated);
        }

        let isbn = validate_details(&cmd.details, settings)?;
        let details = cmd.details.clone();

        Ok(vec![BookEvent::BookCreated(BookCreatedData {
            book_id: cmd.book_id,
            title: details.title,
            description: details.description,
            isbn,
            publisher_id: details.publisher_id,
            author_ids: details.author_ids,
            category_ids: details.category_ids,
            prices: details.prices,
            created_at: Utc::now(),
        })])
    }

    pub fn update(
        &self,
        cmd: &UpdateBook,
        settings: &CatalogSettings,
    ) -> Result<Vec<BookEvent>, BookError> {
        self.ensure_active()?;

        let isbn = validate_details(&cmd.details, settings)?;
        let details = cmd.details.clone();

        Ok(vec![BookEvent::BookUpdated(BookUpdatedData {
            title: details.title,
            description: details.description,
            isbn,
            publisher_id: details.publisher_id,
            author_ids: details.author_ids,
            category_ids: details.category_ids,
            prices: details.prices,
            updated_at: Utc::now(),
        })])
    }

    pub fn soft_delete(&self) -> Result<Vec<BookEvent>, BookError> {
        self.ensure_active()?;

        Ok(vec![BookEvent::BookSoftDeleted(BookSoftDeletedData {
            deleted_at: Utc::now(),
        })])
    }

    pub fn restore(&self) -> Result<Vec<BookEvent>, BookError> {
        if !self.is_deleted() {
            return Err(BookError::NotDeleted);
        }

        Ok(vec![BookEvent::BookRestored(BookRestoredData {
            restored_at: Utc::now(),
        })])
    }

    pub fn schedule_sale(&self, cmd: &ScheduleSale) -> Result<Vec<BookEvent>, BookError> {
        self.ensure_active()?;

        let sale = Sale::new(cmd.discount_percent, cmd.starts_at, cmd.ends_at)?;

        Ok(vec![BookEvent::BookSaleScheduled(BookSaleScheduledData {
            sale,
            scheduled_at: Utc::now(),
        })])
    }

    pub fn cancel_sale(&self) -> Result<Vec<BookEvent>, BookError> {
        self.ensure_active()?;

        if self.sale.is_none() {
            return Err(BookError::NoSaleScheduled);
        }

        Ok(vec![BookEvent::BookSaleCancelled(BookSaleCancelledData {
            cancelled_at: Utc::now(),
        })])
    }

    pub fn update_cover(&self, cmd: &UpdateCover) -> Result<Vec<BookEvent>, BookError> {
        self.ensure_active()?;

        let cover = CoverRef::new(cmd.blob_key.clone(), cmd.content_type.clone())?;

        Ok(vec![BookEvent::BookCoverUpdated(BookCoverUpdatedData {
            cover,
            updated_at: Utc::now(),
        })])
    }

    fn ensure_active(&self) -> Result<(), BookError> {
        if self.is_deleted() {
            return Err(BookError::Deleted);
        }
        Ok(())
    }
}

fn validate_details(details: &BookDetails, settings: &CatalogSettings) -> Result<Isbn, BookError> {
    details
        .title
        .validate("title", settings, MAX_TITLE_CHARS, true)?;
    details
        .description
        .validate("description", settings, MAX_DESCRIPTION_CHARS, false)?;
    details.prices.validate(settings)?;
    Ok(Isbn::parse(&details.isbn)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::{Currency, Locale};

    fn details() -> BookDetails {
        BookDetails {
            title: Translations::new().with(Locale::parse("en").unwrap(), "Dune"),
            description: Translations::new(),
            isbn: "978-0-441-01359-3".to_string(),
            publisher_id: Some(AggregateId::new()),
            author_ids: [AggregateId::new()].into(),
            category_ids: BTreeSet::new(),
            prices: Prices::new().with(Currency::parse("EUR").unwrap(), 1999),
        }
    }

    fn created_book() -> Book {
        let settings = CatalogSettings::default();
        let events = Book::default()
            .create(&CreateBook::new(details()), &settings)
            .unwrap();
        Book::from_history(events)
    }

    #[test]
    fn create_emits_normalized_isbn() {
        let book = created_book();

        assert!(book.id().is_some());
        assert_eq!(book.version(), Version::first());
        assert_eq!(book.isbn().unwrap().as_str(), "9780441013593");
        assert_eq!(book.lifecycle(), Lifecycle::Active);
    }

    #[test]
    fn create_twice_fails() {
        let book = created_book();
        let result = book.create(&CreateBook::new(details()), &CatalogSettings::default());
        assert!(matches!(result, Err(BookError::AlreadyCreated)));
    }

    #[test]
    fn invalid_details_produce_no_event() {
        let settings = CatalogSettings::default();

        let mut bad_isbn = details();
        bad_isbn.isbn = "978-0-441-01359-4".to_string();
        let err = Book::default()
            .create(&CreateBook::new(bad_isbn), &settings)
            .unwrap_err();
        assert!(matches!(err, BookError::Invalid(ref v) if v.field == "isbn"));

        let mut no_default_title = details();
        no_default_title.title = Translations::new().with(Locale::parse("de").unwrap(), "Dune");
        assert!(
            Book::default()
                .create(&CreateBook::new(no_default_title), &settings)
                .is_err()
        );

        let mut no_default_price = details();
        no_default_price.prices = Prices::new().with(Currency::parse("USD").unwrap(), 1999);
        let err = Book::default()
            .create(&CreateBook::new(no_default_price), &settings)
            .unwrap_err();
        assert!(matches!(err, BookError::Invalid(ref v) if v.field == "prices"));
    }

    #[test]
    fn update_replaces_reference_sets() {
        let mut book = created_book();
        let new_author = AggregateId::new();
        let mut next = details();
        next.author_ids = [new_author].into();
        next.publisher_id = None;

        let events = book
            .update(
                &UpdateBook {
                    book_id: book.id().unwrap(),
                    details: next,
                },
                &CatalogSettings::default(),
            )
            .unwrap();
        book.apply_events(events);

        assert_eq!(book.author_ids(), &BTreeSet::from([new_author]));
        assert!(book.publisher_id().is_none());
    }

    #[test]
    fn lifecycle_rules() {
        let mut book = created_book();

        assert!(matches!(book.restore(), Err(BookError::NotDeleted)));

        book.apply_events(book.soft_delete().unwrap());
        assert!(book.is_deleted());

        assert!(matches!(book.soft_delete(), Err(BookError::Deleted)));
        assert!(matches!(book.cancel_sale(), Err(BookError::Deleted)));
        let update = UpdateBook {
            book_id: book.id().unwrap(),
            details: details(),
        };
        let err = book.update(&update, &CatalogSettings::default()).unwrap_err();
        assert_eq!(err.to_string(), "entity deleted");

        book.apply_events(book.restore().unwrap());
        assert!(!book.is_deleted());
        assert!(book.update(&update, &CatalogSettings::default()).is_ok());
    }

    #[test]
    fn sale_schedule_and_cancel() {
        let mut book = created_book();
        assert!(matches!(book.cancel_sale(), Err(BookError::NoSaleScheduled)));

        let start = Utc::now();
        let cmd = ScheduleSale {
            book_id: book.id().unwrap(),
            discount_percent: 30,
            starts_at: start,
            ends_at: start + Duration::days(3),
        };
        book.apply_events(book.schedule_sale(&cmd).unwrap());
        assert_eq!(book.sale().unwrap().discount_percent, 30);

        book.apply_events(book.cancel_sale().unwrap());
        assert!(book.sale().is_none());

        let invalid = ScheduleSale {
            discount_percent: 150,
            ..cmd
        };
        assert!(matches!(
            book.schedule_sale(&invalid),
            Err(BookError::Invalid(_))
        ));
    }

    #[test]
    fn cover_update() {
        let mut book = created_book();
        let cmd = UpdateCover {
            book_id: book.id().unwrap(),
            blob_key: "covers/dune.png".to_string(),
            content_type: "image/png".to_string(),
        };
        book.apply_events(book.update_cover(&cmd).unwrap());
        assert_eq!(book.cover().unwrap().blob_key, "covers/dune.png");
    }

    #[test]
    fn replay_is_deterministic() {
        let settings = CatalogSettings::default();
        let mut history = Book::default()
            .create(&CreateBook::new(details()), &settings)
            .unwrap();
        let book = Book::from_history(history.clone());
        history.extend(book.soft_delete().unwrap());

        let first = Book::from_history(history.clone());
        let second = Book::from_history(history);

        assert_eq!(first, second);
        assert_eq!(first.version(), Version::new(2));
    }
}
