use crate::command::{Command, HELP};
use chrono::{Local, Utc};
use glance_config::{AppConfig, LiveConfig};
use glance_feed::{FeedBackend, FeedEvent, FeedSynchronizer, PushChannel, ReconnectPolicy};
use glance_view::{render_dashboard, terminal_safe, InboxView};
use std::sync::Arc;
use std::time::Duration;

pub fn reconnect_policy(live: &LiveConfig) -> ReconnectPolicy {
    let initial = Duration::from_millis(live.reconnect_initial_ms);
    ReconnectPolicy {
        initial,
        max: Duration::from_millis(live.reconnect_max_ms).max(initial),
        max_attempts: live.max_reconnect_attempts,
    }
}

/// The mounted dashboard: the feed plus the view state the prompt edits.
pub struct Dashboard<B: FeedBackend> {
    sync: FeedSynchronizer<B>,
    view: InboxView,
    channel: Arc<dyn PushChannel>,
    policy: ReconnectPolicy,
    color: bool,
    notice: Option<String>,
}

impl<B: FeedBackend> Dashboard<B> {
    pub fn new(
        sync: FeedSynchronizer<B>,
        channel: Arc<dyn PushChannel>,
        config: &AppConfig,
        color: bool,
    ) -> Self {
        Self {
            sync,
            view: InboxView::new(config.ui.preview_length),
            channel,
            policy: reconnect_policy(&config.live),
            color,
            notice: None,
        }
    }

    /// Start the snapshot load and, when `live` is set, the push subscription.
    pub async fn mount(&mut self, live: bool) {
        self.sync.load_initial();
        if live {
            self.sync
                .subscribe(self.channel.clone(), self.policy.clone())
                .await;
        }
    }

    pub async fn next_event(&mut self) -> Option<FeedEvent> {
        self.sync.next_event().await
    }

    pub fn apply(&mut self, event: FeedEvent) {
        self.sync.apply(event);
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    /// Run one prompt command. Returns `false` once the user quits.
    pub async fn handle(&mut self, command: Command) -> bool {
        self.notice = None;
        match command {
            Command::Search(query) => self.view.set_query(query),
            Command::Open(number) => {
                let found = number.checked_sub(1).is_some_and(|index| {
                    let state = self.sync.state();
                    self.view.select_row(state.emails(), index)
                });
                if !found {
                    self.set_notice(format!("no email at row {number}"));
                }
            }
            Command::Back => self.view.clear_selection(),
            Command::Retry => self.sync.load_initial(),
            Command::Live(true) => {
                self.sync
                    .subscribe(self.channel.clone(), self.policy.clone())
                    .await
            }
            Command::Live(false) => self.sync.unsubscribe().await,
            Command::Help => self.set_notice(HELP),
            Command::Quit => return false,
            Command::Redraw => {}
        }
        true
    }

    pub fn render(&self) -> String {
        let mut out = {
            let state = self.sync.state();
            render_dashboard(&state, &self.view, Utc::now(), &Local, self.color)
        };
        if let Some(notice) = &self.notice {
            out.push_str(&terminal_safe(notice, false));
            out.push('\n');
        }
        out
    }

    pub async fn shutdown(&mut self) {
        self.sync.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use glance_core::{AccountCredentials, Email};
    use glance_feed::{FeedError, SocketIoChannel};

    struct FixedBackend(Vec<Email>);

    #[async_trait]
    impl FeedBackend for FixedBackend {
        async fn fetch_emails(&self, _accounts: &[AccountCredentials]) -> Result<Vec<Email>, FeedError> {
            Ok(self.0.clone())
        }
    }

    fn email(id: i64, subject: &str, date: &str) -> Email {
        Email {
            id: Some(id),
            subject: Some(subject.to_string()),
            date: date.to_string(),
            description: Some(format!("<p>{subject} body</p>")),
            ..Email::default()
        }
    }

    async fn loaded_dashboard() -> Dashboard<FixedBackend> {
        let config = AppConfig::default();
        let backend = Arc::new(FixedBackend(vec![
            email(1, "Invoice due", "2024-01-01T10:00:00Z"),
            email(2, "Team lunch", "2024-01-02T10:00:00Z"),
        ]));
        let channel = Arc::new(SocketIoChannel::new(&config.backend.base_url).expect("channel"));
        let sync = FeedSynchronizer::new(backend, Vec::new());
        let mut dashboard = Dashboard::new(sync, channel, &config, false);

        dashboard.mount(false).await;
        let event = dashboard.next_event().await.expect("snapshot");
        dashboard.apply(event);
        dashboard
    }

    #[test]
    fn policy_follows_live_config() {
        let live = LiveConfig {
            reconnect_initial_ms: 500,
            reconnect_max_ms: 100,
            max_reconnect_attempts: Some(3),
            ..LiveConfig::default()
        };
        let policy = reconnect_policy(&live);
        assert_eq!(policy.initial, Duration::from_millis(500));
        assert_eq!(policy.max, Duration::from_millis(500));
        assert_eq!(policy.max_attempts, Some(3));

        assert_eq!(reconnect_policy(&LiveConfig::default()), ReconnectPolicy::default());
    }

    #[tokio::test]
    async fn commands_drive_the_view() {
        let mut dashboard = loaded_dashboard().await;
        assert!(dashboard.render().contains("Inbox (2)"));

        assert!(dashboard.handle(Command::Open(1)).await);
        assert!(dashboard.render().contains("Team lunch body"));

        assert!(dashboard.handle(Command::Search("invoice".to_string())).await);
        let text = dashboard.render();
        assert!(text.contains("Inbox (1)"));
        assert!(text.contains("Team lunch body"));

        assert!(dashboard.handle(Command::Open(4)).await);
        assert!(dashboard.render().contains("no email at row 4"));

        assert!(dashboard.handle(Command::Open(0)).await);
        assert!(dashboard.render().contains("no email at row 0"));

        assert!(dashboard.handle(Command::Back).await);
        assert!(dashboard.render().contains("No email selected"));

        assert!(!dashboard.handle(Command::Quit).await);
        dashboard.shutdown().await;
    }
}
