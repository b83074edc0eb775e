use chrono::{DateTime, Duration, TimeZone, Utc};
use glance_core::Email;
use std::fmt::Display;

pub const YESTERDAY: &str = "Yesterday";
pub const ELLIPSIS: &str = "...";

/// List label for a timestamp: time of day within 24 hours, `Yesterday`
/// within 48, otherwise month and day. Future timestamps count as recent.
pub fn format_relative<Tz>(date: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let elapsed = now.signed_duration_since(date);
    if elapsed < Duration::hours(24) {
        date.with_timezone(tz).format("%H:%M").to_string()
    } else if elapsed < Duration::hours(48) {
        YESTERDAY.to_string()
    } else {
        date.with_timezone(tz).format("%b %-d").to_string()
    }
}

/// [`format_relative`] for an email, echoing the raw date when it does not parse.
pub fn relative_date<Tz>(email: &Email, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match email.timestamp() {
        Some(date) => format_relative(date, now, tz),
        None => email.date.clone(),
    }
}

pub fn full_date<Tz>(email: &Email, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match email.timestamp() {
        Some(date) => date.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => email.date.clone(),
    }
}

/// Cut `text` to `length` characters, marking the cut with `...`.
pub fn truncate(text: &str, length: usize) -> String {
    match text.char_indices().nth(length) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Avatar letter for a sender.
pub fn sender_initial(from: Option<&str>) -> String {
    from.and_then(|from| from.chars().find(|ch| !ch.is_whitespace() && !ch.is_control()))
        .map(|first| first.to_uppercase().collect())
        .unwrap_or_else(|| "U".to_string())
}

/// Strip control characters and bidi overrides from untrusted text bound
/// for the terminal. Tabs become spaces; newlines survive only in `multiline` text.
pub fn terminal_safe(text: &str, multiline: bool) -> String {
    text.chars()
        .filter_map(|ch| match ch {
            '\n' if multiline => Some('\n'),
            '\n' | '\t' => Some(' '),
            '\u{202a}'..='\u{202e}' | '\u{2066}'..='\u{2069}' => None,
            ch if ch.is_control() => None,
            ch => Some(ch),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-10T12:00:00Z")
            .expect("valid")
            .with_timezone(&Utc)
    }

    #[test]
    fn recent_dates_show_time_of_day() {
        let label = format_relative(now() - Duration::hours(2), now(), &Utc);
        assert_eq!(label, "10:00");
        assert_ne!(label, YESTERDAY);

        assert_eq!(format_relative(now() + Duration::hours(1), now(), &Utc), "13:00");
    }

    #[test]
    fn one_to_two_days_ago_is_yesterday() {
        assert_eq!(format_relative(now() - Duration::hours(30), now(), &Utc), "Yesterday");
        assert_eq!(format_relative(now() - Duration::hours(24), now(), &Utc), "Yesterday");
    }

    #[test]
    fn older_dates_show_month_and_day() {
        assert_eq!(format_relative(now() - Duration::hours(48), now(), &Utc), "May 8");
        assert_eq!(format_relative(now() - Duration::days(40), now(), &Utc), "Mar 31");
    }

    #[test]
    fn respects_the_display_time_zone() {
        let tz = chrono::FixedOffset::east_opt(2 * 3600).expect("offset");
        assert_eq!(format_relative(now() - Duration::hours(2), now(), &tz), "12:00");
    }

    #[test]
    fn unparseable_dates_are_echoed() {
        let email = Email {
            date: "sometime".to_string(),
            ..Email::default()
        };
        assert_eq!(relative_date(&email, now(), &Utc), "sometime");
        assert_eq!(full_date(&email, &Utc), "sometime");
    }

    #[test]
    fn full_date_is_local_timestamp() {
        let email = Email {
            date: "2024-01-02T10:00:00Z".to_string(),
            ..Email::default()
        };
        assert_eq!(full_date(&email, &Utc), "2024-01-02 10:00:00");
    }

    #[test]
    fn truncates_on_characters() {
        assert_eq!(truncate("hello world", 5), "hello...");
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("", 5), "");
        assert_eq!(truncate("héllo wörld", 7), "héllo w...");
    }

    #[test]
    fn initial_falls_back_to_u() {
        assert_eq!(sender_initial(Some("alice <a@example.com>")), "A");
        assert_eq!(sender_initial(Some("  ")), "U");
        assert_eq!(sender_initial(None), "U");
    }

    #[test]
    fn terminal_safe_strips_escape_sequences() {
        let hostile = "hi\x1b]0;pwned\x07\x1b[2J\u{9b}31m\u{202e}gnp.exe";
        let clean = terminal_safe(hostile, false);
        assert!(!clean.chars().any(char::is_control));
        assert_eq!(clean, "hi]0;pwned[2J31mgnp.exe");

        assert_eq!(terminal_safe("a\tb\r\nc", false), "a b c");
        assert_eq!(terminal_safe("a\r\nb", true), "a\nb");
    }
}
