//! Standalone HTML pages built from per-page SVG output.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::{NOTE_NAV, escape_html};

/// Inline style rules of an assembled page. Pages scale with the viewport.
const PAGE_STYLE: &str = "\
body { margin: 0; padding: 0; }
.note-nav { padding: 0.75rem 1rem; border-bottom: 1px solid #ddd; font-family: sans-serif; }
.note-nav a { color: inherit; text-decoration: none; }
svg { display: block; width: 100%; height: auto; }";

static SVG_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<svg(?:\s[^>]*)?>").expect("valid regex"));
static WIDTH_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\swidth\s*=\s*(?:"[^"]*"|'[^']*')"#).expect("valid regex")
});
static HEIGHT_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\sheight\s*=\s*(?:"[^"]*"|'[^']*')"#).expect("valid regex")
});

/// Remove the fixed `width` and `height` attributes of a page's root `<svg>` tag.
///
/// One of each is removed, first occurrence. `viewBox` stays, so CSS can scale
/// the page. A document without an `<svg>` tag has the first occurrence in the
/// whole text removed instead.
pub fn strip_svg_dimensions(page: &str) -> String {
    let (start, end) = match SVG_OPEN_RE.find(page) {
        Some(tag) => (tag.start(), tag.end()),
        None => {
            debug!("page has no <svg> tag, stripping first dimensions found");
            (0, page.len())
        }
    };

    let tag = &page[start..end];
    let tag = WIDTH_ATTR_RE.replacen(tag, 1, "");
    let tag = HEIGHT_ATTR_RE.replacen(&tag, 1, "");

    let mut out = String::with_capacity(page.len());
    out.push_str(&page[..start]);
    out.push_str(&tag);
    out.push_str(&page[end..]);
    out
}

/// Build one standalone HTML document from SVG pages in page order.
///
/// Pages are concatenated without a separator after their dimensions are
/// stripped; the document carries its own inline style and [`NOTE_NAV`].
pub fn assemble_svg_pages(pages: &[String], title: &str) -> String {
    let body: String = pages.iter().map(|page| strip_svg_dimensions(page)).collect();

    debug!(pages = pages.len(), bytes = body.len(), "assembled svg pages");

    format!(
        "<!DOCTYPE html>
<html>
<head>
<meta charset=\"utf-8\">
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">
<title>{title}</title>
<style>
{PAGE_STYLE}
</style>
</head>
<body>
{NOTE_NAV}
{body}
</body>
</html>
",
        title = escape_html(title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(marker: &str) -> String {
        format!(
            r#"<svg class="typst-doc" viewBox="0 0 100 200" width="100pt" height="200pt" xmlns="http://www.w3.org/2000/svg"><rect width="100" height="200" stroke-width="2"/><text>{marker}</text></svg>"#
        )
    }

    #[test]
    fn strips_root_dimensions_only() {
        let result = strip_svg_dimensions(&page("p1"));

        assert!(result.starts_with(
            r#"<svg class="typst-doc" viewBox="0 0 100 200" xmlns="http://www.w3.org/2000/svg">"#
        ));
        // Inner elements keep theirs.
        assert!(result.contains(r#"<rect width="100" height="200" stroke-width="2"/>"#));
    }

    #[test]
    fn strips_once_per_attribute() {
        let input = r#"<svg width="1" width="2" height="3" height="4"></svg>"#;
        assert_eq!(
            strip_svg_dimensions(input),
            r#"<svg width="2" height="4"></svg>"#
        );
    }

    #[test]
    fn stroke_width_is_not_a_width() {
        let input = r#"<svg stroke-width="3" width="10pt" height="5pt"></svg>"#;
        assert_eq!(strip_svg_dimensions(input), r#"<svg stroke-width="3"></svg>"#);
    }

    #[test]
    fn page_without_svg_tag_strips_first_occurrence() {
        let input = r#"<g width="1"><g width="2" height='3'></g></g>"#;
        assert_eq!(strip_svg_dimensions(input), r#"<g><g width="2"></g></g>"#);
    }

    #[test]
    fn assembles_pages_in_order() {
        let pages = vec![page("first-page"), page("second-page")];
        let html = assemble_svg_pages(&pages, "Notes");

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Notes</title>"));
        assert!(html.contains(NOTE_NAV));
        assert_eq!(html.matches("<svg ").count(), 2);
        assert_eq!(html.matches(r#"width="100pt""#).count(), 0);
        assert_eq!(html.matches(r#"height="200pt""#).count(), 0);

        let first = html.find("first-page").expect("first page");
        let second = html.find("second-page").expect("second page");
        assert!(first < second);
        assert!(html.contains("</svg><svg "), "pages joined without separator");
    }

    #[test]
    fn style_scales_svg_to_full_width() {
        let html = assemble_svg_pages(&[page("x")], "T");
        assert!(html.contains("svg { display: block; width: 100%; height: auto; }"));
        assert!(html.contains("body { margin: 0; padding: 0; }"));
        assert!(html.find(NOTE_NAV) < html.find("<svg "));
    }

    #[test]
    fn typst_fixture_page() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/svg/page-1.svg");
        let svg = std::fs::read_to_string(&path).expect("read fixture");
        let result = strip_svg_dimensions(&svg);

        assert!(!result.contains(r#"width="595.276pt""#));
        assert!(!result.contains(r#"height="841.89pt""#));
        assert!(result.contains(r#"viewBox="0 0 595.276 841.89""#));
        assert!(result.contains(r#"stroke-width="1""#));
    }

    #[test]
    fn empty_page_list_still_builds_document() {
        let html = assemble_svg_pages(&[], "Empty");
        assert!(html.contains("<body>"));
        assert!(!html.contains("<svg"));
    }
}
