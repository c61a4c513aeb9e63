//! Plain-text passes over uncompiled Typst markup.
//!
//! Each pass is a function `&str -> String` applied in sequence. None of them
//! parse Typst; they only remove the syntax that reads as noise in a preview.

use std::sync::LazyLock;

use regex::Regex;

use crate::collapse_whitespace;

/// Run the full pass pipeline and return whitespace-collapsed plain text.
pub fn markup_text(src: &str) -> String {
    let mut result = strip_headings(src);

    result = strip_statement_lines(&result);
    result = strip_directives(&result);
    result = strip_inline_math(&result);
    result = strip_emphasis(&result);

    collapse_whitespace(&result)
}

// ---------------------------------------------------------------------------
// Pass 1: Heading lines
// ---------------------------------------------------------------------------

/// Drop every line that starts with `=` markers followed by a blank or the line end.
fn strip_headings(src: &str) -> String {
    static HEADING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^=+(?:[ \t\r].*)?$").expect("valid regex"));

    HEADING_RE.replace_all(src, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Statement lines
// ---------------------------------------------------------------------------

/// Drop lines that are Typst statements (`#set`, `#show`, `#let`, `#import`, `#include`).
///
/// Their arguments are code, not prose, and rarely sit in one parenthesized group.
fn strip_statement_lines(src: &str) -> String {
    static STATEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^[ \t]*#(?:set|show|let|import|include)\b.*$").expect("valid regex")
    });

    STATEMENT_RE.replace_all(src, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Directives
// ---------------------------------------------------------------------------

/// Remove `#name` tokens together with a directly attached `(...)` argument list.
///
/// A directly attached `[...]` content block loses its brackets but keeps its
/// text, which is stripped recursively. Unbalanced groups are left in place.
fn strip_directives(src: &str) -> String {
    static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"#[A-Za-z_][A-Za-z0-9_-]*(?:\.[A-Za-z_][A-Za-z0-9_-]*)*")
            .expect("valid regex")
    });

    let mut out = String::with_capacity(src.len());
    let mut cursor = 0;

    for m in DIRECTIVE_RE.find_iter(src) {
        // Inside an argument list or content block we already consumed.
        if m.start() < cursor {
            continue;
        }

        out.push_str(&src[cursor..m.start()]);
        cursor = m.end();

        if let Some(len) = balanced_group_len(&src[cursor..], '(', ')') {
            cursor += len;
        }
        if let Some(len) = balanced_group_len(&src[cursor..], '[', ']') {
            out.push(' ');
            out.push_str(&strip_directives(&src[cursor + 1..cursor + len - 1]));
            out.push(' ');
            cursor += len;
        }
    }

    out.push_str(&src[cursor..]);
    out
}

/// Byte length of the balanced group opening at the start of `s`, delimiters included.
fn balanced_group_len(s: &str, open: char, close: char) -> Option<usize> {
    if !s.starts_with(open) {
        return None;
    }

    let mut depth = 0usize;
    for (idx, c) in s.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(idx + c.len_utf8());
            }
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Pass 4: Inline math
// ---------------------------------------------------------------------------

/// Remove `$...$` segments, pairing each dollar sign with the next one.
fn strip_inline_math(src: &str) -> String {
    static MATH_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\$[^$]*\$").expect("valid regex"));

    MATH_RE.replace_all(src, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 5: Emphasis markers
// ---------------------------------------------------------------------------

/// Remove `*`, `_` and backtick characters.
fn strip_emphasis(src: &str) -> String {
    src.chars().filter(|c| !matches!(c, '*' | '_' | '`')).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_headings_removes_all_levels() {
        let input = "= Title\nbody\n=== Deep heading\nmore";
        let result = strip_headings(input);
        assert!(!result.contains("Title"));
        assert!(!result.contains("Deep heading"));
        assert!(result.contains("body"));
        assert!(result.contains("more"));
    }

    #[test]
    fn strip_headings_removes_bare_marker_lines() {
        assert_eq!(strip_headings("==\nbody\n=\r\nmore\n="), "\nbody\n\nmore\n");
    }

    #[test]
    fn strip_headings_needs_a_blank_after_markers() {
        let input = "==not a heading\na = b";
        assert_eq!(strip_headings(input), input);
    }

    #[test]
    fn strip_statement_lines_drops_code_lines() {
        let input = "#set text(size: 11pt)\n  #show heading: set text(blue)\n#let x = 1\nprose #settings stays";
        let result = strip_statement_lines(input);
        assert!(!result.contains("11pt"));
        assert!(!result.contains("heading"));
        assert!(!result.contains("x = 1"));
        assert!(result.contains("prose #settings stays"));
    }

    #[test]
    fn strip_directives_with_and_without_args() {
        assert_eq!(strip_directives("a #pagebreak() b"), "a  b");
        assert_eq!(strip_directives("a #v b"), "a  b");
        assert_eq!(strip_directives("#lorem(30)\nhello"), "\nhello");
    }

    #[test]
    fn strip_directives_handles_nested_parens() {
        let input = r#"before #figure(image("cat.png", width: 50%), caption: [A (small) cat]) after"#;
        assert_eq!(strip_directives(input), "before  after");
    }

    #[test]
    fn strip_directives_dotted_names() {
        assert_eq!(strip_directives("x #sym.arrow.r y"), "x  y");
    }

    #[test]
    fn strip_directives_unwraps_content_block() {
        let result = strip_directives("see #link(\"https://typst.app\")[the docs #emph[here]] now");
        assert_eq!(collapse_whitespace(&result), "see the docs here now");
    }

    #[test]
    fn strip_directives_leaves_unbalanced_group() {
        assert_eq!(strip_directives("#box(unclosed"), "(unclosed");
    }

    #[test]
    fn strip_inline_math_is_non_greedy() {
        assert_eq!(strip_inline_math("a $x$ b $y^2$ c"), "a  b  c");
    }

    #[test]
    fn strip_inline_math_keeps_lone_dollar() {
        assert_eq!(strip_inline_math("costs 5$ only"), "costs 5$ only");
    }

    #[test]
    fn strip_emphasis_removes_markers() {
        assert_eq!(strip_emphasis("*bold* _em_ `code`"), "bold em code");
    }

    #[test]
    fn full_pipeline_yields_plain_text() {
        let input = "= Notes\n\n#set par(justify: true)\nThe *rank* of $A$ is `r`.\n\n== Proof\nTrivial.";
        assert_eq!(markup_text(input), "The rank of is r. Trivial.");
    }

    #[test]
    fn empty_source_is_empty() {
        assert_eq!(markup_text(""), "");
        assert_eq!(markup_text("= Only a heading\n"), "");
    }
}
