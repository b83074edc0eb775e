//! Presentation for the email dashboard: search, list/detail state and
//! terminal rendering.

mod category;
mod filter;
mod format;
mod inbox;
mod render;
mod sanitize;
mod text;

pub use category::{CategoryTag, TagColor, UNCATEGORIZED};
pub use filter::filter_emails;
pub use format::{
    format_relative, full_date, relative_date, sender_initial, terminal_safe, truncate,
};
pub use inbox::{
    EmailDetail, EmailRow, InboxView, DEFAULT_PREVIEW_LENGTH, NO_EMAILS, NO_PREVIEW, NO_SELECTION,
    NO_SUBJECT, UNKNOWN_SENDER,
};
pub use render::{render_dashboard, render_tag, status_lines, TITLE};
pub use sanitize::{body_html, sanitize_html, EMPTY_BODY};
pub use text::html_to_text;
