//! Shared types for the book catalog engine.

pub mod settings;
pub mod types;

pub use settings::{CatalogSettings, Currency, Locale, SettingsError};
pub use types::AggregateId;
