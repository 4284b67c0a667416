//! Reconnecting notification consumer.
//!
//! [`NotificationClient`] owns one cancellable task that connects to a
//! [`NotificationSource`], forwards every notification to a channel and
//! reconnects with exponential backoff when the stream fails or ends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use crate::Result;
use crate::hub::NotificationHub;
use crate::notification::Notification;

/// Something a client can open a notification stream against.
#[async_trait]
pub trait NotificationSource: Send + Sync + 'static {
    async fn connect(&self) -> Result<BoxStream<'static, Result<Notification>>>;
}

#[async_trait]
impl NotificationSource for NotificationHub {
    async fn connect(&self) -> Result<BoxStream<'static, Result<Notification>>> {
        let connected = futures_util::stream::once(async { Ok(Notification::connected()) });
        Ok(connected.chain(self.stream()).boxed())
    }
}

/// Backoff between reconnect attempts.
///
/// The delay doubles after each failed attempt up to `max_delay`, and
/// starts over from `initial_delay` once a connection succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay: max_delay.max(initial_delay),
        }
    }

    /// Delay before reconnect attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Handle to a running client task.
#[derive(Clone)]
pub struct ClientHandle {
    cancel_tx: watch::Sender<bool>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ClientHandle {
    /// Stops the client and waits for its task to exit. Safe to call twice.
    pub async fn cancel(&self) {
        let _ = self.cancel_tx.send(true);

        let task = self.task.lock().await.take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            tracing::error!(error = %e, "notification client task panicked");
        }
    }
}

/// Entry point for starting a reconnecting client.
pub struct NotificationClient;

impl NotificationClient {
    /// Spawns the client task. Notifications (including each connection's
    /// `Connected` frame) arrive on the returned receiver.
    pub fn spawn<S: NotificationSource>(
        source: S,
        policy: RetryPolicy,
    ) -> (ClientHandle, mpsc::UnboundedReceiver<Notification>) {
        let (sink, receiver) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let task = tokio::spawn(run(source, policy, sink, cancel_rx));

        (
            ClientHandle {
                cancel_tx,
                task: Arc::new(Mutex::new(Some(task))),
            },
            receiver,
        )
    }
}

async fn run<S: NotificationSource>(
    source: S,
    policy: RetryPolicy,
    sink: mpsc::UnboundedSender<Notification>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let mut attempt: u32 = 0;

    loop {
        if *cancel_rx.borrow() {
            break;
        }

        let connected = tokio::select! {
            connected = source.connect() => connected,
            _ = cancel_rx.changed() => break,
        };

        match connected {
            Ok(mut stream) => {
                attempt = 0;
                tracing::info!("notification stream connected");

                loop {
                    tokio::select! {
                        item = stream.next() => match item {
                            Some(Ok(notification)) => {
                                if sink.send(notification).is_err() {
                                    // Nobody is listening any more.
                                    return;
                                }
                            }
                            Some(Err(e)) => {
                                tracing::warn!(error = %e, "notification stream failed");
                                break;
                            }
                            None => {
                                tracing::info!("notification stream ended");
                                break;
                            }
                        },
                        _ = cancel_rx.changed() => return,
                    }
                }
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "notification connect failed");
            }
        }

        let delay = policy.delay_for(attempt);
        attempt = attempt.saturating_add(1);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel_rx.changed() => break,
        }
    }

    tracing::info!("notification client stopped");
}
