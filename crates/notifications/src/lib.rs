//! Change notifications for the catalog.
//!
//! Committed events are flattened into [`Notification`]s by the
//! [`NotificationMapper`] and fanned out by the [`NotificationHub`]. On the
//! consuming side, the [`InvalidationRegistry`] turns a notification into
//! query keys, [`QuerySubscriber`] reloads the queries those keys cover, and
//! [`NotificationClient`] keeps a connection alive with backoff.

pub mod client;
pub mod error;
pub mod hub;
pub mod mapper;
pub mod notification;
pub mod registry;
pub mod subscriber;

pub use client::{ClientHandle, NotificationClient, NotificationSource, RetryPolicy};
pub use error::{NotificationError, Result};
pub use hub::NotificationHub;
pub use mapper::{NotificationMapper, notification_type_for};
pub use notification::Notification;
pub use registry::InvalidationRegistry;
pub use subscriber::{QueryLoader, QuerySubscriber, ReloadMode};
