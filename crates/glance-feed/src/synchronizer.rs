use crate::state::{FeedState, LiveStatus};
use crate::subscription::{subscribe, FeedEvent, ReconnectPolicy, Subscription};
use crate::{load_snapshot, FeedBackend, PushChannel};
use glance_core::AccountCredentials;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Owns the email list for one mounted dashboard.
///
/// Snapshot results and push events are queued and applied one at a time by
/// whoever drives [`FeedSynchronizer::next_event`] and
/// [`FeedSynchronizer::apply`]; readers observe the result through
/// [`FeedSynchronizer::watch`].
pub struct FeedSynchronizer<B: FeedBackend> {
    backend: Arc<B>,
    accounts: Arc<Vec<AccountCredentials>>,
    state: watch::Sender<FeedState>,
    snapshots_tx: mpsc::UnboundedSender<FeedEvent>,
    snapshots_rx: mpsc::UnboundedReceiver<FeedEvent>,
    subscription: Option<Subscription>,
    live_rx: Option<mpsc::UnboundedReceiver<FeedEvent>>,
    resync_on_reconnect: bool,
    mounted: bool,
}

impl<B: FeedBackend> FeedSynchronizer<B> {
    pub fn new(backend: Arc<B>, accounts: Vec<AccountCredentials>) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        let (snapshots_tx, snapshots_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            accounts: Arc::new(accounts),
            state,
            snapshots_tx,
            snapshots_rx,
            subscription: None,
            live_rx: None,
            resync_on_reconnect: true,
            mounted: true,
        }
    }

    pub fn with_resync_on_reconnect(mut self, enabled: bool) -> Self {
        self.resync_on_reconnect = enabled;
        self
    }

    pub fn state(&self) -> watch::Ref<'_, FeedState> {
        self.state.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Request a fresh snapshot. The result arrives as [`FeedEvent::Snapshot`].
    pub fn load_initial(&self) {
        if !self.mounted {
            return;
        }
        let mut generation = 0;
        self.state.send_modify(|state| generation = state.begin_load());

        let backend = self.backend.clone();
        let accounts = self.accounts.clone();
        let events = self.snapshots_tx.clone();
        tokio::spawn(async move {
            let result = load_snapshot(backend.as_ref(), &accounts).await;
            // The receiver is closed once the dashboard unmounts.
            let _ = events.send(FeedEvent::Snapshot { generation, result });
        });
        tracing::debug!(generation, accounts = self.accounts.len(), "snapshot requested");
    }

    /// Start live updates, replacing any previous subscription.
    pub async fn subscribe(&mut self, channel: Arc<dyn PushChannel>, policy: ReconnectPolicy) {
        if !self.mounted {
            return;
        }
        self.stop_subscription().await;

        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = subscribe(channel, policy, tx);
        tracing::info!(subscription = %subscription.id(), "live updates requested");
        self.subscription = Some(subscription);
        self.live_rx = Some(rx);
        self.state.send_modify(|state| state.set_live(LiveStatus::Connecting));
    }

    /// Stop live updates. Events still queued from the subscription are discarded.
    pub async fn unsubscribe(&mut self) {
        if self.stop_subscription().await {
            self.state
                .send_modify(|state| state.set_live(LiveStatus::Closed { reason: None }));
        }
    }

    async fn stop_subscription(&mut self) -> bool {
        self.live_rx = None;
        match self.subscription.take() {
            Some(mut subscription) => {
                subscription.unsubscribe().await;
                true
            }
            None => false,
        }
    }

    /// Wait for the next queued event. Returns `None` after [`FeedSynchronizer::shutdown`].
    pub async fn next_event(&mut self) -> Option<FeedEvent> {
        if !self.mounted {
            return None;
        }

        let live_rx = &mut self.live_rx;
        tokio::select! {
            Some(event) = self.snapshots_rx.recv() => Some(event),
            Some(event) = recv_live(live_rx) => Some(event),
            else => None,
        }
    }

    pub fn apply(&mut self, event: FeedEvent) {
        if !self.mounted {
            return;
        }

        match event {
            FeedEvent::Snapshot { generation, result } => {
                let outcome = result.as_ref().map(Vec::len).map_err(ToString::to_string);
                let applied = self
                    .state
                    .send_if_modified(|state| state.finish_load(generation, result));
                match (applied, outcome) {
                    (false, _) => tracing::debug!(generation, "superseded snapshot dropped"),
                    (true, Ok(count)) => tracing::info!(generation, count, "snapshot loaded"),
                    (true, Err(err)) => tracing::warn!(generation, "snapshot failed: {err}"),
                }
            }
            FeedEvent::Connected => {
                self.state.send_modify(|state| state.set_live(LiveStatus::Live));
            }
            FeedEvent::Reconnected => {
                self.state.send_modify(|state| state.set_live(LiveStatus::Live));
                if self.resync_on_reconnect {
                    tracing::info!("push channel restored, resynchronizing");
                    self.load_initial();
                }
            }
            FeedEvent::NewEmail(email) => {
                self.state.send_modify(|state| state.apply_push(email));
            }
            FeedEvent::Disconnected { reason, retry_in } => {
                self.state
                    .send_modify(|state| state.set_live(LiveStatus::Paused { reason, retry_in }));
            }
            FeedEvent::Closed { reason } => {
                self.subscription = None;
                self.live_rx = None;
                self.state.send_modify(|state| {
                    state.set_live(LiveStatus::Closed {
                        reason: Some(reason),
                    })
                });
            }
        }
    }

    /// Tear down: stop live updates and drop any snapshot still in flight.
    pub async fn shutdown(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.unsubscribe().await;
        self.snapshots_rx.close();
        while self.snapshots_rx.try_recv().is_ok() {}
        tracing::debug!("feed synchronizer shut down");
    }
}

async fn recv_live(rx: &mut Option<mpsc::UnboundedReceiver<FeedEvent>>) -> Option<FeedEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
