use glance_core::Email;
use std::borrow::Borrow;

/// Keep emails whose subject or HTML body contains `query`, ignoring case.
///
/// The preview is not searched. An empty query keeps everything, and the
/// input order is preserved. Every call scans the whole list.
pub fn filter_emails<I, E>(emails: I, query: &str) -> Vec<E>
where
    I: IntoIterator<Item = E>,
    E: Borrow<Email>,
{
    if query.is_empty() {
        return emails.into_iter().collect();
    }

    let needle = query.to_lowercase();
    emails
        .into_iter()
        .filter(|email| matches_query(email.borrow(), &needle))
        .collect()
}

fn matches_query(email: &Email, needle: &str) -> bool {
    [email.subject.as_deref(), email.description.as_deref()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}
