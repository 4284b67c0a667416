//! Server-Sent-Events notification stream.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use event_store::EventStore;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use notifications::{Notification, NotificationError, NotificationSource};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /notifications
///
/// Opens with a `Connected` frame, then sends one frame per notification
/// with the SSE `event:` field set to the notification type. A connection
/// that falls behind gets a `Resync` frame and is closed, so a client never
/// sees a silent gap. Closing the connection drops the subscription.
#[tracing::instrument(skip(state))]
pub async fn stream<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let notifications = state
        .hub
        .connect()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    metrics::counter!("notification_streams_opened_total").increment(1);
    tracing::debug!(subscribers = state.hub.subscriber_count(), "notification stream opened");

    let frames = until_lagged(notifications).filter_map(|notification| async move {
        match notification.to_json() {
            Ok(data) => Some(Ok::<_, Infallible>(
                SseEvent::default()
                    .event(notification.notification_type.as_str())
                    .data(data),
            )),
            Err(e) => {
                tracing::warn!(error = %e, "notification encoding failed");
                None
            }
        }
    });

    Ok(Sse::new(frames).keep_alive(KeepAlive::new().interval(state.sse_keep_alive)))
}

/// Passes notifications through until the subscription lags, then emits a
/// single resync notification and ends.
fn until_lagged(
    notifications: BoxStream<'static, notifications::Result<Notification>>,
) -> impl Stream<Item = Notification> {
    futures_util::stream::unfold(Some(notifications), |state| async move {
        let mut notifications = state?;
        loop {
            match notifications.next().await? {
                Ok(notification) => return Some((notification, Some(notifications))),
                Err(NotificationError::Lagged(missed)) => {
                    tracing::warn!(missed, "notification stream lagged, closing");
                    metrics::counter!("notification_streams_lagged_total").increment(1);
                    return Some((Notification::resync(), None));
                }
                Err(e) => tracing::warn!(error = %e, "notification stream error"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::CatalogSettings;
    use notifications::{NotificationHub, NotificationMapper};
    use std::time::Duration;

    fn book_created() -> Notification {
        Notification {
            notification_type: "BookCreated".to_string(),
            ..Notification::connected()
        }
    }

    #[tokio::test]
    async fn lagging_connection_gets_resync_and_closes() {
        let hub = NotificationHub::new(1, NotificationMapper::new(Arc::new(CatalogSettings::default())));
        let notifications = hub.connect().await.unwrap();
        for _ in 0..3 {
            hub.publish(book_created());
        }

        let types: Vec<String> = tokio::time::timeout(
            Duration::from_secs(1),
            until_lagged(notifications)
                .map(|n| n.notification_type)
                .collect::<Vec<_>>(),
        )
        .await
        .expect("stream should end after falling behind");

        assert_eq!(types, vec![Notification::CONNECTED, Notification::RESYNC]);
    }

    #[tokio::test]
    async fn stream_errors_other_than_lag_are_skipped() {
        let items: Vec<notifications::Result<Notification>> = vec![
            Ok(Notification::connected()),
            Err(NotificationError::Transport("reset".to_string())),
            Ok(book_created()),
        ];

        let types: Vec<String> = until_lagged(futures_util::stream::iter(items).boxed())
            .map(|n| n.notification_type)
            .collect()
            .await;

        assert_eq!(types, vec!["Connected", "BookCreated"]);
    }
}
