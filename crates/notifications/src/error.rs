//! Notification error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// The source could not be reached or dropped the connection.
    #[error("Notification transport error: {0}")]
    Transport(String),

    /// The subscriber fell behind and missed notifications.
    #[error("Subscriber lagged behind by {0} notifications")]
    Lagged(u64),

    #[error("Notification decoding error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A subscriber's loader failed.
    #[error("Query load failed: {0}")]
    Load(String),
}

pub type Result<T> = std::result::Result<T, NotificationError>;
