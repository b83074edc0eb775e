//! Terminal rendering of the dashboard.

use crate::category::CategoryTag;
use crate::inbox::{EmailDetail, EmailRow, InboxView, NO_EMAILS, NO_SELECTION};
use crate::format::terminal_safe;
use crate::text::html_to_text;
use chrono::{DateTime, TimeZone, Utc};
use glance_feed::{FeedState, LiveStatus, SyncPhase};
use std::fmt::{Display, Write};

pub const TITLE: &str = "Email Aggregator Dashboard";
const RULE: &str = "------------------------------------------------------------";

/// Lines describing load and push-channel health, most important first.
pub fn status_lines(state: &FeedState) -> Vec<String> {
    let mut lines = Vec::new();
    match state.phase() {
        SyncPhase::Loading => lines.push("Loading emails...".to_string()),
        SyncPhase::Failed => lines.push(format!(
            "Could not load emails: {}. Type `retry` to try again.",
            state.error().unwrap_or("unknown error")
        )),
        SyncPhase::Idle | SyncPhase::Ready => {}
    }
    match state.live() {
        LiveStatus::Offline | LiveStatus::Live => {}
        LiveStatus::Connecting => lines.push("Connecting to live updates...".to_string()),
        LiveStatus::Paused { reason, retry_in } => lines.push(format!(
            "Live updates paused ({reason}), retrying in {}s",
            retry_in.as_secs_f32().ceil() as u64
        )),
        LiveStatus::Closed { reason: Some(reason) } => {
            lines.push(format!("Live updates stopped: {reason}"))
        }
        LiveStatus::Closed { reason: None } => lines.push("Live updates off".to_string()),
    }
    lines
}

pub fn render_tag(tag: &CategoryTag, color: bool) -> String {
    let label = line(&tag.label);
    if color {
        format!("\x1b[{}m[{label}]\x1b[0m", tag.color.ansi())
    } else {
        format!("[{label}]")
    }
}

/// Draw the whole dashboard as text.
pub fn render_dashboard<Tz>(
    state: &FeedState,
    view: &InboxView,
    now: DateTime<Utc>,
    tz: &Tz,
    color: bool,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out, "Search: {}", line(view.query()));
    for status in status_lines(state) {
        let _ = writeln!(out, "! {}", line(&status));
    }
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "{}", view.header(state.emails()));
    let rows = view.rows(state.emails(), now, tz);
    if rows.is_empty() {
        let _ = writeln!(out, "{NO_EMAILS}");
    }
    for (idx, row) in rows.iter().enumerate() {
        write_row(&mut out, idx + 1, row, color);
    }

    let _ = writeln!(out, "{RULE}");
    match view.detail(tz) {
        Some(detail) => write_detail(&mut out, &detail, color),
        None => {
            let _ = writeln!(out, "{NO_SELECTION}");
        }
    }
    out
}

fn write_row(out: &mut String, number: usize, row: &EmailRow, color: bool) {
    let marker = if row.selected { '>' } else { ' ' };
    let _ = writeln!(
        out,
        "{marker}{number:>3}. ({}) {}  {}",
        line(&row.initial),
        line(&row.sender),
        line(&row.date)
    );
    let _ = writeln!(out, "      {}", line(&row.subject));
    let _ = writeln!(out, "      {}", line(&row.preview));
    let _ = writeln!(out, "      {}", render_tag(&row.tag, color));
}

fn write_detail(out: &mut String, detail: &EmailDetail, color: bool) {
    let _ = writeln!(out, "({}) {}", line(&detail.initial), line(&detail.sender));
    let _ = writeln!(out, "{}", line(&detail.date));
    let _ = writeln!(out, "{}  {}", line(&detail.subject), render_tag(&detail.tag, color));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", terminal_safe(&html_to_text(&detail.body_html), true));
}

/// Backend text shown on a single line.
fn line(text: &str) -> String {
    terminal_safe(text, false)
}
