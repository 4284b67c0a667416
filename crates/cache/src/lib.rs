//! Server-side query caching for the catalog.
//!
//! - [`CacheKey`]: deterministic keys scoped by locale, tenant and role
//! - [`CacheStore`] with an in-memory backend
//! - [`QueryCache`]: L1/L2 tiers with a tag index
//! - [`CacheInvalidator`]: evicts tags on the commit path

pub mod error;
pub mod invalidator;
pub mod key;
pub mod query_cache;
pub mod store;

pub use error::{CacheError, Result};
pub use invalidator::CacheInvalidator;
pub use key::CacheKey;
pub use query_cache::{QueryCache, TierTtls};
pub use store::{CacheStore, InMemoryStore};
