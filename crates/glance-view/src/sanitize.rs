use std::collections::HashSet;

/// Shown in the detail pane when an email has no body.
pub const EMPTY_BODY: &str = "<p>No content available</p>";

/// Strip scripts, event handlers and unsafe URLs from an email body.
pub fn sanitize_html(html: &str) -> String {
    let schemes: HashSet<&str> = ["http", "https", "mailto"].into_iter().collect();
    ammonia::Builder::default()
        .url_schemes(schemes)
        .link_rel(Some("noopener noreferrer"))
        .clean(html)
        .to_string()
}

/// Sanitized body for the detail pane, or [`EMPTY_BODY`] when there is none.
pub fn body_html(description: Option<&str>) -> String {
    match description.filter(|body| !body.trim().is_empty()) {
        Some(body) => sanitize_html(body),
        None => EMPTY_BODY.to_string(),
    }
}
