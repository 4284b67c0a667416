//! Cache error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store failed.
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Invalid cache configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
