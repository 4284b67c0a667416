//! Read models and projections for the catalog query side.
//!
//! - [`Projection`] trait for processing events into read models, with
//!   version gating so replays and live commits converge
//! - [`ReadModel`] trait for query access to denormalized data
//! - [`ProjectionProcessor`] for catch-up and rebuilds from the store
//! - [`ProjectionListener`] and [`ProjectionWorker`] for the commit path
//! - Three views: directory, book search and book statistics

pub mod error;
#[cfg(test)]
mod fixtures;
pub mod listener;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;
pub mod worker;

pub use error::{ProjectionError, Result};
pub use listener::{ProjectionListener, WorkerFeed};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition, VersionCheck, check_version};
pub use read_model::ReadModel;
pub use views::{
    AuthorDocument, BookDocument, BookQuery, BookSearchView, BookStatisticsView,
    CatalogViews, CategoryDocument, DirectoryView, PublisherDocument, ReferenceKind,
    ReferenceStatistics,
};
pub use worker::{ProjectionWorker, WorkerHandle};
