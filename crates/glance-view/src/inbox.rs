use crate::category::CategoryTag;
use crate::filter::filter_emails;
use crate::format::{full_date, relative_date, sender_initial, truncate};
use crate::sanitize::body_html;
use chrono::{DateTime, TimeZone, Utc};
use glance_core::{Email, EmailKey};
use std::fmt::Display;

pub const UNKNOWN_SENDER: &str = "Unknown Sender";
pub const NO_SUBJECT: &str = "No Subject";
pub const NO_PREVIEW: &str = "No preview available";
pub const NO_EMAILS: &str = "No emails found.";
pub const NO_SELECTION: &str = "No email selected";

pub const DEFAULT_PREVIEW_LENGTH: usize = 80;

/// One line of the email list, ready to draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRow {
    pub key: EmailKey,
    pub sender: String,
    pub initial: String,
    pub subject: String,
    pub preview: String,
    pub date: String,
    pub tag: CategoryTag,
    pub selected: bool,
}

/// The open email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDetail {
    pub sender: String,
    pub initial: String,
    pub date: String,
    pub subject: String,
    pub tag: CategoryTag,
    /// Sanitized HTML.
    pub body_html: String,
}

/// Search text and selection for the list/detail panes.
///
/// The view never modifies the feed; it only reads the list it is given.
#[derive(Debug, Clone)]
pub struct InboxView {
    query: String,
    selected: Option<Email>,
    preview_length: usize,
}

impl Default for InboxView {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_LENGTH)
    }
}

impl InboxView {
    pub fn new(preview_length: usize) -> Self {
        Self {
            query: String::new(),
            selected: None,
            preview_length,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn selected(&self) -> Option<&Email> {
        self.selected.as_ref()
    }

    /// Keeps its own copy, so the selection outlives filtering and reloads.
    pub fn select(&mut self, email: &Email) {
        self.selected = Some(email.clone());
    }

    /// Select by position in the filtered list. Returns `false` when out of range.
    pub fn select_row(&mut self, emails: &[Email], index: usize) -> bool {
        let picked = self.visible(emails).get(index).map(|email| (*email).clone());
        match picked {
            Some(email) => {
                self.selected = Some(email);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn visible<'a>(&self, emails: &'a [Email]) -> Vec<&'a Email> {
        filter_emails(emails, &self.query)
    }

    /// List header with the number of matching emails.
    pub fn header(&self, emails: &[Email]) -> String {
        format!("Inbox ({})", self.visible(emails).len())
    }

    pub fn rows<Tz>(&self, emails: &[Email], now: DateTime<Utc>, tz: &Tz) -> Vec<EmailRow>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let selected = self.selected.as_ref().map(Email::key);
        self.visible(emails)
            .into_iter()
            .map(|email| {
                let key = email.key();
                EmailRow {
                    selected: selected == Some(key),
                    key,
                    sender: sender(email),
                    initial: sender_initial(email.from.as_deref()),
                    subject: subject(email),
                    preview: match non_empty(email.preview.as_deref()) {
                        Some(preview) => truncate(preview, self.preview_length),
                        None => NO_PREVIEW.to_string(),
                    },
                    date: relative_date(email, now, tz),
                    tag: CategoryTag::for_email(email),
                }
            })
            .collect()
    }

    pub fn detail<Tz>(&self, tz: &Tz) -> Option<EmailDetail>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let email = self.selected.as_ref()?;
        Some(EmailDetail {
            sender: sender(email),
            initial: sender_initial(email.from.as_deref()),
            date: full_date(email, tz),
            subject: subject(email),
            tag: CategoryTag::for_email(email),
            body_html: body_html(email.description.as_deref()),
        })
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.trim().is_empty())
}

fn sender(email: &Email) -> String {
    non_empty(email.from.as_deref())
        .unwrap_or(UNKNOWN_SENDER)
        .to_string()
}

fn subject(email: &Email) -> String {
    non_empty(email.subject.as_deref())
        .unwrap_or(NO_SUBJECT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::TagColor;
    use crate::sanitize::EMPTY_BODY;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-10T12:00:00Z")
            .expect("valid")
            .with_timezone(&Utc)
    }

    fn email(id: i64, subject: &str, date: &str) -> Email {
        Email {
            id: Some(id),
            subject: Some(subject.to_string()),
            from: Some(format!("sender{id}@example.com")),
            date: date.to_string(),
            ..Email::default()
        }
    }

    #[test]
    fn missing_fields_use_fallbacks() {
        let rows = InboxView::default().rows(&[Email::default()], now(), &Utc);
        let row = &rows[0];
        assert_eq!(row.sender, UNKNOWN_SENDER);
        assert_eq!(row.initial, "U");
        assert_eq!(row.subject, NO_SUBJECT);
        assert_eq!(row.preview, NO_PREVIEW);
        assert_eq!(row.tag.label, "uncategorized");
        assert_eq!(row.tag.color, TagColor::Slate);
        assert!(!row.selected);
    }

    #[test]
    fn rows_show_relative_dates_and_truncated_previews() {
        let mut recent = email(1, "Standup", "2024-05-10T10:00:00Z");
        recent.preview = Some("x".repeat(100));
        let older = email(2, "Lunch", "2024-05-09T06:00:00Z");

        let rows = InboxView::new(10).rows(&[recent, older], now(), &Utc);
        assert_eq!(rows[0].date, "10:00");
        assert_eq!(rows[0].preview, format!("{}...", "x".repeat(10)));
        assert_eq!(rows[0].initial, "S");
        assert_eq!(rows[1].date, "Yesterday");
    }

    #[test]
    fn filtering_keeps_order_and_count() {
        let emails = vec![
            email(1, "Invoice due", "2024-05-10T10:00:00Z"),
            email(2, "Team lunch", "2024-05-09T10:00:00Z"),
            email(3, "Second invoice", "2024-05-08T10:00:00Z"),
        ];
        let mut view = InboxView::default();
        assert_eq!(view.header(&emails), "Inbox (3)");

        view.set_query("INVOICE");
        let ids: Vec<_> = view.rows(&emails, now(), &Utc).iter().map(|row| row.key).collect();
        assert_eq!(ids, vec![EmailKey::Id(1), EmailKey::Id(3)]);
        assert_eq!(view.header(&emails), "Inbox (2)");

        view.set_query("nothing matches");
        assert!(view.rows(&emails, now(), &Utc).is_empty());
        assert_eq!(view.header(&emails), "Inbox (0)");
    }

    #[test]
    fn selection_highlights_and_survives_filtering() {
        let emails = vec![
            email(1, "Invoice due", "2024-05-10T10:00:00Z"),
            email(2, "Team lunch", "2024-05-09T10:00:00Z"),
        ];
        let mut view = InboxView::default();
        assert!(view.select_row(&emails, 1));
        assert!(!view.select_row(&emails, 5));

        let rows = view.rows(&emails, now(), &Utc);
        assert!(!rows[0].selected);
        assert!(rows[1].selected);

        view.set_query("invoice");
        assert_eq!(view.rows(&emails, now(), &Utc).len(), 1);
        let detail = view.detail(&Utc).expect("still selected");
        assert_eq!(detail.subject, "Team lunch");

        view.clear_selection();
        assert!(view.detail(&Utc).is_none());
    }

    #[test]
    fn detail_sanitizes_body() {
        let mut selected = email(1, "Hi", "2024-05-10T10:00:00Z");
        selected.description = Some(r#"<p>Hello</p><script>alert(1)</script>"#.to_string());
        selected.category = Some("work".to_string());

        let mut view = InboxView::default();
        view.select(&selected);
        let detail = view.detail(&Utc).expect("detail");
        assert_eq!(detail.body_html, "<p>Hello</p>");
        assert_eq!(detail.date, "2024-05-10 10:00:00");
        assert_eq!(detail.tag.color, TagColor::Blue);

        selected.description = None;
        view.select(&selected);
        assert_eq!(view.detail(&Utc).expect("detail").body_html, EMPTY_BODY);
    }
}
