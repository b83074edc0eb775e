use crate::{FeedError, PushChannel, PushEvent};
use glance_core::Email;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Everything the UI loop consumes, in delivery order.
#[derive(Debug)]
pub enum FeedEvent {
    /// Result of a snapshot request started by the synchronizer, tagged
    /// with the generation it was requested under.
    Snapshot {
        generation: u64,
        result: Result<Vec<Email>, FeedError>,
    },
    /// First successful connection of a subscription.
    Connected,
    NewEmail(Email),
    Disconnected { reason: String, retry_in: Duration },
    /// Connection restored after an outage; events may have been missed.
    Reconnected,
    /// Reconnect attempts exhausted; the subscription has stopped.
    Closed { reason: String },
}

/// Exponential backoff between reconnect attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial: Duration,
    pub max: Duration,
    /// Consecutive failed attempts before giving up; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

/// Handle to a running push subscription.
///
/// Dropping the handle aborts the connection task.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Close the connection and wait for the task to stop. Once this returns
    /// the subscription sends nothing more. Later calls do nothing.
    pub async fn unsubscribe(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(err) = task.await {
            if !err.is_cancelled() {
                tracing::warn!(subscription = %self.id, "push task ended abnormally: {err}");
            }
        }
        tracing::info!(subscription = %self.id, "push subscription closed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn a task that keeps `channel` connected and forwards its events to `events`.
pub fn subscribe(
    channel: Arc<dyn PushChannel>,
    policy: ReconnectPolicy,
    events: mpsc::UnboundedSender<FeedEvent>,
) -> Subscription {
    let id = Uuid::new_v4();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(run_subscription(id, channel, policy, events, shutdown_rx));
    tracing::debug!(subscription = %id, "push subscription started");

    Subscription {
        id,
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}

async fn run_subscription(
    id: Uuid,
    channel: Arc<dyn PushChannel>,
    policy: ReconnectPolicy,
    events: mpsc::UnboundedSender<FeedEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut attempt = 0_u32;
    let mut connected_before = false;

    loop {
        let connected = tokio::select! {
            _ = &mut shutdown => return,
            result = channel.connect() => result,
        };

        let reason = match connected {
            Ok(mut stream) => {
                attempt = 0;
                let event = if connected_before {
                    FeedEvent::Reconnected
                } else {
                    FeedEvent::Connected
                };
                connected_before = true;
                if events.send(event).is_err() {
                    let _ = stream.close().await;
                    return;
                }

                loop {
                    tokio::select! {
                        _ = &mut shutdown => {
                            if let Err(err) = stream.close().await {
                                tracing::debug!(subscription = %id, "close after unsubscribe failed: {err}");
                            }
                            return;
                        }
                        next = stream.next_event() => match next {
                            Ok(Some(PushEvent::NewEmail(email))) => {
                                tracing::debug!(subscription = %id, id = ?email.id, "new email pushed");
                                if events.send(FeedEvent::NewEmail(email)).is_err() {
                                    let _ = stream.close().await;
                                    return;
                                }
                            }
                            Ok(None) => break "connection closed by server".to_string(),
                            Err(err) => break err.to_string(),
                        }
                    }
                }
            }
            Err(err) => err.to_string(),
        };

        if policy.max_attempts.is_some_and(|max| attempt >= max) {
            tracing::warn!(subscription = %id, %reason, attempt, "giving up on push channel");
            let _ = events.send(FeedEvent::Closed { reason });
            return;
        }

        let retry_in = policy.delay(attempt);
        attempt = attempt.saturating_add(1);
        tracing::warn!(
            subscription = %id,
            %reason,
            attempt,
            retry_in_ms = retry_in.as_millis() as u64,
            "push channel disconnected"
        );
        if events.send(FeedEvent::Disconnected { reason, retry_in }).is_err() {
            return;
        }

        tokio::select! {
            _ = &mut shutdown => return,
            _ = tokio::time::sleep(retry_in) => {}
        }
    }
}
