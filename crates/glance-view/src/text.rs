//! Plain-text rendering of sanitized HTML for the terminal.
//!
//! Block elements become paragraphs, lists get markers, blockquotes are
//! prefixed with `> ` and links are numbered with their targets listed at
//! the end.

use scraper::{ElementRef, Html, Node};

/// Render an HTML fragment as plain text.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_fragment(html);
    let mut ctx = Ctx::default();
    ctx.walk_elem(doc.root_element());
    ctx.finish()
}

struct ListLvl {
    ordered: bool,
    idx: u32,
}

#[derive(Default)]
struct Ctx {
    out: String,
    pre: bool,
    bq: usize,
    lists: Vec<ListLvl>,
    link_href: Option<String>,
    link_text: String,
    links: Vec<String>,
}

impl Ctx {
    fn finish(mut self) -> String {
        let trimmed = self.out.trim_end().len();
        self.out.truncate(trimmed);
        if !self.links.is_empty() {
            self.out.push_str("\n\n");
            let refs: Vec<String> = self
                .links
                .iter()
                .enumerate()
                .map(|(idx, href)| format!("[{}] {href}", idx + 1))
                .collect();
            self.out.push_str(&refs.join("\n"));
        }
        self.out
    }

    // -- line helpers ------------------------------------------------------

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn write(&mut self, s: &str) {
        for (idx, line) in s.split('\n').enumerate() {
            if idx > 0 {
                self.out.push('\n');
            }
            if line.is_empty() {
                continue;
            }
            if self.bq > 0 && self.at_line_start() {
                self.out.push_str(&"> ".repeat(self.bq));
            }
            self.out.push_str(line);
        }
    }

    fn line(&mut self) {
        if !self.at_line_start() {
            let trimmed = self.out.trim_end_matches(' ').len();
            self.out.truncate(trimmed);
            self.out.push('\n');
        }
    }

    fn blk(&mut self) {
        self.line();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn push_text(&mut self, s: &str) {
        if self.link_href.is_some() {
            self.link_text.push_str(s);
        }
        if self.pre {
            self.write(s);
            return;
        }
        let collapsed = collapse_ws(s);
        let text = if self.at_line_start() || self.out.ends_with(' ') {
            collapsed.trim_start()
        } else {
            collapsed.as_str()
        };
        if !text.is_empty() {
            self.write(text);
        }
    }

    // -- tree walk ---------------------------------------------------------

    fn walk_children(&mut self, parent: ElementRef<'_>) {
        for child in parent.children() {
            match child.value() {
                Node::Text(t) => self.push_text(&t.text),
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        self.walk_elem(el);
                    }
                }
                _ => {}
            }
        }
    }

    fn walk_elem(&mut self, el: ElementRef<'_>) {
        let tag = el.value().name.local.as_ref();
        if !self.enter(tag, el) {
            return;
        }
        self.walk_children(el);
        self.leave(tag);
    }

    fn enter(&mut self, tag: &str, el: ElementRef<'_>) -> bool {
        match tag {
            "style" | "script" | "head" | "title" => return false,

            "p" | "div" | "section" | "article" | "main" | "header" | "footer" | "nav"
            | "figure" | "figcaption" | "center" | "dl" | "table" | "h1" | "h2" | "h3"
            | "h4" | "h5" | "h6" => self.blk(),
            "br" => self.out.push('\n'),
            "hr" => {
                self.blk();
                self.write("----");
                self.blk();
            }

            "blockquote" => {
                self.blk();
                self.bq += 1;
            }
            "pre" => {
                self.blk();
                self.pre = true;
            }

            "ul" | "ol" => {
                self.blk();
                self.lists.push(ListLvl {
                    ordered: tag == "ol",
                    idx: 0,
                });
            }
            "li" => {
                self.line();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(lv) if lv.ordered => {
                        lv.idx += 1;
                        format!("{}. ", lv.idx)
                    }
                    _ => "\u{2022} ".to_string(),
                };
                self.write(&format!("{}{marker}", "  ".repeat(depth)));
            }
            "dt" | "dd" | "tr" => self.line(),
            "td" | "th" => {
                if !self.at_line_start() {
                    self.write(" | ");
                }
            }

            "a" => {
                self.link_href = el.value().attr("href").map(|s| s.to_string());
                self.link_text.clear();
            }
            "img" => {
                let alt = el.value().attr("alt").unwrap_or("image");
                self.push_text(&format!("[{alt}]"));
            }

            _ => {}
        }
        true
    }

    fn leave(&mut self, tag: &str) {
        match tag {
            "p" | "div" | "section" | "article" | "main" | "header" | "footer" | "nav"
            | "figure" | "figcaption" | "center" | "dl" | "table" | "h1" | "h2" | "h3"
            | "h4" | "h5" | "h6" => self.blk(),
            "blockquote" => {
                self.blk();
                self.bq = self.bq.saturating_sub(1);
            }
            "pre" => {
                self.pre = false;
                self.blk();
            }
            "ul" | "ol" => {
                self.lists.pop();
                self.blk();
            }
            "a" => {
                if let Some(href) = self.link_href.take() {
                    if self.link_text.trim() != href {
                        self.links.push(href);
                        let marker = format!(" [{}]", self.links.len());
                        self.write(&marker);
                    }
                    self.link_text.clear();
                }
            }
            _ => {}
        }
    }
}

/// Collapse runs of whitespace into a single space.
fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !ws {
                out.push(' ');
                ws = true;
            }
        } else {
            out.push(ch);
            ws = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        let text = html_to_text("<p>Hello <b>world</b></p><p>Second</p>");
        assert_eq!(text, "Hello world\n\nSecond");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(html_to_text("<p>  a \n  b  </p>"), "a b");
    }

    #[test]
    fn renders_list_markers() {
        assert_eq!(html_to_text("<ul><li>One</li><li>Two</li></ul>"), "\u{2022} One\n\u{2022} Two");
        assert_eq!(html_to_text("<ol><li>One</li><li>Two</li></ol>"), "1. One\n2. Two");
    }

    #[test]
    fn numbers_links() {
        let text = html_to_text(r#"<p>See <a href="https://example.com/docs">docs</a>.</p>"#);
        assert_eq!(text, "See docs [1].\n\n[1] https://example.com/docs");

        let bare = html_to_text(r#"<a href="https://example.com">https://example.com</a>"#);
        assert_eq!(bare, "https://example.com");
    }

    #[test]
    fn quotes_and_preformatted_text() {
        assert_eq!(html_to_text("<blockquote><p>quoted</p></blockquote>"), "> quoted");
        assert_eq!(html_to_text("<pre>a\n  b</pre>"), "a\n  b");
    }

    #[test]
    fn skips_style_content() {
        assert_eq!(html_to_text("<style>p { color: red }</style><p>Hi</p>"), "Hi");
        assert_eq!(html_to_text(""), "");
    }
}
