//! Post-processing of compiled notes into pages of the site.
//!
//! This crate provides:
//! - [`inject_into_html`]: stylesheet link and navigation for compiler-emitted HTML
//! - [`svg`]: standalone page assembly from per-page SVG output
//! - [`RenderedArtifact`]: the compiler output of one note, either of the above

pub mod svg;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

pub use svg::{assemble_svg_pages, strip_svg_dimensions};

/// Stylesheet link inserted into every note page. Notes live at `notes/<folder>/`.
pub const STYLESHEET_LINK: &str = r#"<link rel="stylesheet" href="../../style.css">"#;

/// Navigation block placed at the top of every note page.
pub const NOTE_NAV: &str =
    r#"<nav class="note-nav"><a href="../../">&larr; Back to notes</a></nav>"#;

// ---------------------------------------------------------------------------
// Rendered artifact
// ---------------------------------------------------------------------------

/// Compiler output for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedArtifact {
    /// A single HTML document.
    Html(String),
    /// SVG documents, one per page, in page order starting at page 1.
    SvgPages(Vec<String>),
}

impl RenderedArtifact {
    /// Post-process into the final `index.html` of the note.
    pub fn into_page(self, title: &str) -> String {
        match self {
            Self::Html(html) => inject_into_html(&html, title),
            Self::SvgPages(pages) => assemble_svg_pages(&pages, title),
        }
    }
}

// ---------------------------------------------------------------------------
// HTML injection
// ---------------------------------------------------------------------------

static HEAD_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("valid regex"));
static HEAD_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").expect("valid regex"));
static HTML_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html(?:\s[^>]*)?>").expect("valid regex"));
static BODY_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body(?:\s[^>]*)?>").expect("valid regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title[\s>]").expect("valid regex"));

/// Insert the stylesheet link and navigation block into a compiled HTML document.
///
/// - The link becomes the first child of the first `<head>`. Without a
///   `<head>`, one is created right after the opening `<html>` tag.
/// - A `<title>` with `title` is added next to the link when the head has none.
/// - [`NOTE_NAV`] goes right after the opening `<body>` tag.
///
/// Only the first occurrence of each tag is used. Missing tags are not an
/// error: the matching insertion is skipped and the rest of the document is
/// returned as is.
pub fn inject_into_html(html: &str, title: &str) -> String {
    let mut head_items = format!("{STYLESHEET_LINK}\n");
    if !head_has_title(html) {
        head_items.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    }

    let mut result = if let Some(head) = HEAD_OPEN_RE.find(html) {
        insert_at(html, head.end(), &format!("\n{head_items}"))
    } else if let Some(root) = HTML_OPEN_RE.find(html) {
        insert_at(html, root.end(), &format!("\n<head>\n{head_items}</head>"))
    } else {
        debug!("no <head> or <html> tag, stylesheet not injected");
        html.to_string()
    };

    match BODY_OPEN_RE.find(&result) {
        Some(body) => {
            let at = body.end();
            result = insert_at(&result, at, &format!("\n{NOTE_NAV}\n"));
        }
        None => debug!("no <body> tag, navigation not injected"),
    }

    result
}

/// Whether the document's head section already carries a `<title>`.
fn head_has_title(html: &str) -> bool {
    let Some(head) = HEAD_OPEN_RE.find(html) else {
        return false;
    };
    let rest = &html[head.end()..];
    let head_section = match HEAD_CLOSE_RE.find(rest) {
        Some(close) => &rest[..close.start()],
        None => rest,
    };
    TITLE_RE.is_match(head_section)
}

fn insert_at(s: &str, at: usize, insertion: &str) -> String {
    let mut out = String::with_capacity(s.len() + insertion.len());
    out.push_str(&s[..at]);
    out.push_str(insertion);
    out.push_str(&s[at..]);
    out
}

/// Escape text for use in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture(name: &str) -> String {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name);
        std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    #[test]
    fn synthesizes_head_when_missing() {
        let html = "<html><body><p>hi</p></body></html>";
        let result = inject_into_html(html, "T");

        let expected_head = format!("<html>\n<head>\n{STYLESHEET_LINK}\n<title>T</title>\n</head>");
        assert!(result.starts_with(&expected_head), "got {result}");

        let nav_at = result.find(NOTE_NAV).expect("nav injected");
        let body_at = result.find("<body>").expect("body kept");
        let p_at = result.find("<p>hi</p>").expect("content kept");
        assert_eq!(nav_at, body_at + "<body>\n".len());
        assert!(p_at > nav_at);
    }

    #[test]
    fn link_is_first_child_of_existing_head() {
        let html = "<html><head><meta charset=\"utf-8\"><title>Set</title></head><body></body></html>";
        let result = inject_into_html(html, "Ignored");

        assert!(result.contains(&format!("<head>\n{STYLESHEET_LINK}\n<meta")));
        assert_eq!(result.matches("<title>").count(), 1);
        assert!(!result.contains("Ignored"));
    }

    #[test]
    fn head_with_attributes_is_matched_but_header_is_not() {
        let html = "<html><head lang=\"en\"></head><body><header>top</header></body></html>";
        let result = inject_into_html(html, "T");

        assert!(result.contains(&format!("<head lang=\"en\">\n{STYLESHEET_LINK}")));
        assert!(result.contains("<header>top</header>"));
        assert_eq!(result.matches(STYLESHEET_LINK).count(), 1);
    }

    #[test]
    fn only_first_body_is_used() {
        let html = "<html><head></head><body><body></body></html>";
        let result = inject_into_html(html, "T");
        assert_eq!(result.matches(NOTE_NAV).count(), 1);
    }

    #[test]
    fn no_anchor_tags_leaves_document_unchanged() {
        let html = "<p>just a fragment</p>";
        assert_eq!(inject_into_html(html, "T"), html);
        assert_eq!(inject_into_html("", "T"), "");
    }

    #[test]
    fn body_without_html_still_gets_nav() {
        let html = "<body><p>x</p></body>";
        let result = inject_into_html(html, "T");
        assert!(!result.contains(STYLESHEET_LINK));
        assert!(result.starts_with(&format!("<body>\n{NOTE_NAV}\n<p>x</p>")));
    }

    #[test]
    fn title_is_escaped() {
        let html = "<html><head></head><body></body></html>";
        let result = inject_into_html(html, "Fish & <Chips>");
        assert!(result.contains("<title>Fish &amp; &lt;Chips&gt;</title>"));
    }

    #[test]
    fn typst_fixture_gets_link_and_nav() {
        let html = load_fixture("html/typst-note.html");
        let result = inject_into_html(&html, "Linear Maps");

        assert!(result.contains(&format!("<head>\n{STYLESHEET_LINK}\n<title>Linear Maps</title>")));
        assert!(result.contains(&format!("<body>\n{NOTE_NAV}\n")));
        assert!(result.contains("<h2>Linear Maps</h2>"));
    }

    #[test]
    fn artifact_dispatches_on_variant() {
        let html = RenderedArtifact::Html("<html><body></body></html>".into()).into_page("T");
        assert!(html.contains(NOTE_NAV));

        let pages = RenderedArtifact::SvgPages(vec!["<svg width=\"1pt\" height=\"1pt\"></svg>".into()])
            .into_page("T");
        assert!(pages.starts_with("<!DOCTYPE html>"));
        assert!(pages.contains("<svg></svg>"));
    }

    #[test]
    fn escape_html_handles_all_specials() {
        assert_eq!(escape_html(r#"a&b<c>"d"'e'"#), "a&amp;b&lt;c&gt;&quot;d&quot;&#39;e&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
