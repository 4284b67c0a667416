//! In-process fan-out of notifications to live connections.

use async_trait::async_trait;
use event_store::{CommitListener, EventEnvelope};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::mapper::NotificationMapper;
use crate::notification::Notification;
use crate::{NotificationError, Result};

/// Broadcasts notifications for committed events.
///
/// Each connection holds its own receiver; dropping it releases the
/// subscription. Slow receivers lose the oldest notifications once the
/// channel capacity is exceeded.
#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
    mapper: NotificationMapper,
}

impl NotificationHub {
    pub fn new(capacity: usize, mapper: NotificationMapper) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, mapper }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// A subscription as a stream; lag is surfaced as an error item.
    pub fn stream(&self) -> BoxStream<'static, Result<Notification>> {
        BroadcastStream::new(self.subscribe())
            .map(|item| {
                item.map_err(|err| match err {
                    BroadcastStreamRecvError::Lagged(missed) => NotificationError::Lagged(missed),
                })
            })
            .boxed()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends to every current subscriber, returning how many received it.
    pub fn publish(&self, notification: Notification) -> usize {
        let notification_type = notification.notification_type.clone();
        // No subscribers is not an error; the notification is simply dropped.
        let delivered = self.sender.send(notification).unwrap_or(0);
        metrics::counter!("notifications_published_total", "type" => notification_type)
            .increment(1);
        delivered
    }
}

#[async_trait]
impl CommitListener for NotificationHub {
    fn name(&self) -> &'static str {
        "notification-hub"
    }

    async fn on_commit(&self, events: &[EventEnvelope]) -> event_store::Result<()> {
        for event in events {
            if let Some(notification) = self.mapper.map(event) {
                let delivered = self.publish(notification);
                tracing::debug!(
                    event_type = %event.event_type,
                    aggregate_id = %event.aggregate_id,
                    delivered,
                    "notification published"
                );
            }
        }
        Ok(())
    }
}
