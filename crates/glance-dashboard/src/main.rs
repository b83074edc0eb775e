mod app;
mod command;

use anyhow::Context;
use app::Dashboard;
use glance_config::{apply_env, ConfigManager};
use glance_feed::{FeedBackend, FeedEvent, FeedSynchronizer, HttpFeedBackend, SocketIoChannel};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout belongs to the dashboard.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

enum Input {
    Line(Option<String>),
    Feed(Option<FeedEvent>),
    Interrupt,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let manager = match config_path_arg() {
        Some(path) => ConfigManager::at(path),
        None => ConfigManager::new(),
    }
    .context("initialize config manager")?;
    let mut config = manager.load().context("load app config")?;
    apply_env(&mut config, |key| std::env::var(key).ok()).context("apply environment")?;
    if config.accounts.is_empty() {
        tracing::warn!(
            path = %manager.config_path().display(),
            "no mail accounts configured"
        );
    }

    let backend = Arc::new(
        HttpFeedBackend::new(&config.backend.base_url, config.backend.request_timeout())
            .context("create backend client")?,
    );
    let channel =
        Arc::new(SocketIoChannel::new(&config.backend.base_url).context("create push channel")?);
    let sync = FeedSynchronizer::new(backend, config.credentials())
        .with_resync_on_reconnect(config.live.resync_on_reconnect);

    let color = config.ui.color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();
    let mut dashboard = Dashboard::new(sync, channel, &config, color);
    dashboard.mount(config.live.enabled).await;
    draw(&dashboard)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line.context("read stdin")?),
            event = dashboard.next_event() => Input::Feed(event),
            _ = tokio::signal::ctrl_c() => Input::Interrupt,
        };

        match input {
            Input::Line(Some(line)) => match command::parse(&line) {
                Ok(command) => {
                    if !dashboard.handle(command).await {
                        break;
                    }
                }
                Err(message) => dashboard.set_notice(message),
            },
            Input::Feed(Some(event)) => dashboard.apply(event),
            Input::Line(None) | Input::Feed(None) | Input::Interrupt => break,
        }
        draw(&dashboard)?;
    }

    dashboard.shutdown().await;
    Ok(())
}

fn config_path_arg() -> Option<PathBuf> {
    let mut args = std::env::args_os().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

fn draw<B: FeedBackend>(dashboard: &Dashboard<B>) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    if stdout.is_terminal() {
        write!(stdout, "\x1b[2J\x1b[H")?;
    }
    write!(stdout, "{}> ", dashboard.render())?;
    stdout.flush()?;
    Ok(())
}
