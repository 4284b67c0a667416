//! Read model views for the catalog query side.

pub mod book_search;
pub mod directory;
pub mod statistics;

pub use book_search::{BookDocument, BookQuery, BookSearchView};
pub use directory::{
    AuthorDocument, CategoryDocument, CategoryRef, DirectoryView, NamedRef, PublisherDocument,
    ResolvedNames,
};
pub use statistics::{BookStatisticsView, ReferenceKind, ReferenceStatistics};

use std::sync::Arc;

use common::CatalogSettings;

use crate::projection::Projection;
use crate::read_model::ReadModel;

/// The catalog's read models, wired to share one directory lookup.
#[derive(Clone)]
pub struct CatalogViews {
    pub directory: DirectoryView,
    pub books: BookSearchView,
    pub statistics: BookStatisticsView,
}

impl CatalogViews {
    pub fn new(settings: Arc<CatalogSettings>) -> Self {
        let directory = DirectoryView::new(settings.clone());
        Self {
            books: BookSearchView::new(directory.clone(), settings),
            directory,
            statistics: BookStatisticsView::new(),
        }
    }

    /// Views applied on the commit path. The directory comes first so book
    /// documents see names committed in the same batch.
    pub fn synchronous(&self) -> Vec<Arc<dyn Projection>> {
        vec![
            Arc::new(self.directory.clone()),
            Arc::new(self.books.clone()),
        ]
    }

    /// Views applied by the background worker.
    pub fn asynchronous(&self) -> Vec<Arc<dyn Projection>> {
        vec![Arc::new(self.statistics.clone())]
    }

    pub fn all(&self) -> Vec<Arc<dyn Projection>> {
        let mut all = self.synchronous();
        all.extend(self.asynchronous());
        all
    }

    pub fn read_models(&self) -> [&dyn ReadModel; 3] {
        [&self.directory, &self.books, &self.statistics]
    }
}
