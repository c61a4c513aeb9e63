//! Preview text extraction for notes.
//!
//! Turns a rendered note (HTML) or its uncompiled Typst source into a short,
//! single-line plain-text summary for the index listing.

mod markup;

use scraper::Html;
use tracing::{debug, instrument};

pub use markup::markup_text;

/// Marker appended to a preview that was cut short.
pub const ELLIPSIS: &str = "...";

/// Default maximum preview length, in characters.
pub const DEFAULT_MAX_LEN: usize = 200;

/// Elements whose text never reaches a preview.
const HIDDEN_ELEMENTS: [&str; 2] = ["script", "style"];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Input to preview extraction. A build uses one mode for all its notes.
#[derive(Debug, Clone, Copy)]
pub enum PreviewSource<'a> {
    /// A rendered HTML document.
    Html(&'a str),
    /// Raw Typst markup.
    Markup(&'a str),
}

impl PreviewSource<'_> {
    fn mode(&self) -> &'static str {
        match self {
            Self::Html(_) => "html",
            Self::Markup(_) => "markup",
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract a whitespace-collapsed preview of at most `max_len` characters.
///
/// Empty input gives an empty preview. See [`truncate_preview`] for how long
/// text is shortened.
#[instrument(skip(source), fields(mode = source.mode()))]
pub fn extract_preview(source: PreviewSource<'_>, max_len: usize) -> String {
    let text = match source {
        PreviewSource::Html(html) => html_text(html),
        PreviewSource::Markup(src) => markup_text(src),
    };

    let preview = truncate_preview(&text, max_len);

    debug!(
        text_len = text.chars().count(),
        preview_len = preview.chars().count(),
        "preview extracted"
    );

    preview
}

/// Visible text of an HTML document, in document order.
///
/// Text nodes under `<script>` or `<style>` are dropped; the rest are joined
/// with single spaces and whitespace-collapsed.
pub fn html_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    let parts: Vec<&str> = doc
        .tree
        .root()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
            });
            if hidden { None } else { Some(&**text) }
        })
        .collect();

    collapse_whitespace(&parts.join(" "))
}

/// Replace every whitespace run with one space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shorten `text` to at most `max_len` characters, ellipsis included.
///
/// Text that already fits is returned unchanged. Otherwise the text is cut to
/// leave room for [`ELLIPSIS`] and moved back to the last whitespace so no word
/// is split. When the kept part has no whitespace at all (one very long word)
/// the hard cut stands.
pub fn truncate_preview(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let marker_len = ELLIPSIS.chars().count();
    if max_len <= marker_len {
        return ELLIPSIS.chars().take(max_len).collect();
    }

    let budget = max_len - marker_len;
    let cut = text
        .char_indices()
        .nth(budget)
        .map_or(text.len(), |(idx, _)| idx);
    let head = &text[..cut];

    // A cut right before whitespace already ends on a whole word.
    let kept = if text[cut..].starts_with(char::is_whitespace) {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(idx) => &head[..idx],
            None => head,
        }
    };

    format!("{}{ELLIPSIS}", kept.trim_end())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn load_fixture(name: &str) -> String {
        fs::read_to_string(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
    }

    fn assert_clean(preview: &str) {
        assert_eq!(preview, preview.trim(), "leading/trailing whitespace");
        assert!(
            !preview
                .chars()
                .zip(preview.chars().skip(1))
                .any(|(a, b)| a.is_whitespace() && b.is_whitespace()),
            "consecutive whitespace in {preview:?}"
        );
    }

    // --- HTML mode ---

    #[test]
    fn html_skips_script_and_style() {
        let html = r#"<html><head><style>body { color: red; }</style></head>
            <body><p>Visible text.</p><script>var hidden = "secret";</script><p>More.</p></body></html>"#;
        let preview = extract_preview(PreviewSource::Html(html), DEFAULT_MAX_LEN);

        assert_eq!(preview, "Visible text. More.");
        assert!(!preview.contains("secret"));
        assert!(!preview.contains("color"));
    }

    #[test]
    fn html_script_text_hidden_even_when_nested() {
        let html = "<body><div><script><p>looks visible</p></script></div><p>shown</p></body>";
        let preview = extract_preview(PreviewSource::Html(html), DEFAULT_MAX_LEN);
        assert_eq!(preview, "shown");
    }

    #[test]
    fn html_joins_adjacent_nodes_with_space() {
        let html = "<body><h2>Title</h2><p>First<em>second</em></p></body>";
        assert_eq!(html_text(html), "Title First second");
    }

    #[test]
    fn html_collapses_whitespace() {
        let html = "<body>\n  <p>  lots\n\n of \t space  </p>\n</body>";
        let preview = extract_preview(PreviewSource::Html(html), DEFAULT_MAX_LEN);
        assert_eq!(preview, "lots of space");
        assert_clean(&preview);
    }

    #[test]
    fn html_empty_document() {
        assert_eq!(extract_preview(PreviewSource::Html(""), DEFAULT_MAX_LEN), "");
        assert_eq!(
            extract_preview(PreviewSource::Html("<html><body></body></html>"), DEFAULT_MAX_LEN),
            ""
        );
    }

    #[test]
    fn html_typst_fixture() {
        let html = load_fixture("html/typst-note.html");
        let preview = extract_preview(PreviewSource::Html(&html), DEFAULT_MAX_LEN);

        assert!(preview.starts_with("Linear Maps"), "got {preview:?}");
        assert!(!preview.contains("MathJax"));
        assert!(!preview.contains("font-family"));
        assert!(preview.chars().count() <= DEFAULT_MAX_LEN);
        assert!(preview.ends_with(ELLIPSIS));
        assert_clean(&preview);
    }

    // --- Markup mode ---

    #[test]
    fn markup_worked_example() {
        let src = "= Intro\n#figure(img.png)\nSome $x+1$ text with *bold*.";
        let preview = extract_preview(PreviewSource::Markup(src), DEFAULT_MAX_LEN);
        assert_eq!(preview, "Some text with bold.");
    }

    #[test]
    fn markup_typst_fixture() {
        let src = load_fixture("typst/main.typ");
        let preview = extract_preview(PreviewSource::Markup(&src), DEFAULT_MAX_LEN);

        assert!(preview.starts_with("A linear map"), "got {preview:?}");
        assert!(!preview.contains('#'));
        assert!(!preview.contains('$'));
        assert!(!preview.contains('*'));
        assert_clean(&preview);
    }

    // --- Truncation ---

    #[test]
    fn short_text_returned_verbatim() {
        let text = "A short preview.";
        assert_eq!(truncate_preview(text, 200), text);
        assert_eq!(truncate_preview(text, text.len()), text);
    }

    #[test]
    fn long_text_cut_at_word_boundary() {
        let text = "alpha beta gamma delta";
        // budget = 12 - 3 = 9 chars: "alpha bet" -> back to "alpha"
        assert_eq!(truncate_preview(text, 12), "alpha...");
    }

    #[test]
    fn cut_landing_on_word_end_keeps_the_word() {
        let text = "alpha beta gamma";
        // budget = 13 - 3 = 10 chars: "alpha beta", next char is a space
        assert_eq!(truncate_preview(text, 13), "alpha beta...");
    }

    #[test]
    fn single_long_word_is_hard_cut() {
        let text = "a".repeat(50);
        let preview = truncate_preview(&text, 10);
        assert_eq!(preview, format!("{}...", "a".repeat(7)));
        assert_eq!(preview.chars().count(), 10);
    }

    #[test]
    fn tiny_limit_truncates_marker() {
        assert_eq!(truncate_preview("abcdef", 2), "..");
        assert_eq!(truncate_preview("abcdef", 3), "...");
    }

    #[test]
    fn length_counts_chars_not_bytes() {
        let text = "żółw ".repeat(60);
        let collapsed = collapse_whitespace(&text);
        let preview = truncate_preview(&collapsed, 20);
        assert!(preview.chars().count() <= 20);
        assert_eq!(preview, "żółw żółw żółw...");
    }

    #[test]
    fn preview_never_exceeds_limit() {
        let words = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do";
        for max in 1..=words.len() + 5 {
            let preview = truncate_preview(words, max);
            assert!(preview.chars().count() <= max, "max={max} got {preview:?}");
            if words.chars().count() > max {
                assert!(preview.ends_with(ELLIPSIS) || max < ELLIPSIS.len());
            } else {
                assert_eq!(preview, words);
            }
            assert_clean(&preview);
        }
    }
}
