//! Markup normalisation: deterministic conversion of chapter (X)HTML into
//! paragraph-structured plain text.
//!
//! This is a best-effort renderer, not an HTML parser. Malformed or deeply
//! nested markup may leave stray characters behind; that is accepted.
//!
//! ## Rule Order
//!
//! Rules must run in this order: scripts, styles and comments go before
//! any tag handling so their bodies never leak into the text; block tags
//! become newlines before the generic tag strip erases them; entities are
//! decoded after every tag rule so a decoded `&lt;` is never taken for a
//! tag; `&amp;` is decoded last so `&amp;lt;` yields `&lt;`, not `<`.
//!
//! Because entity decoding can produce `<`, `&` or extra spaces, running
//! `normalize` twice is only a no-op for text that had no entities.

use once_cell::sync::Lazy;
use regex::Regex;

/// Convert raw chapter markup into plain text.
///
/// Pure and total: never fails, worst case returns an empty string.
///
/// Rules (applied in order):
/// 0. Normalise line endings (CRLF/CR → LF)
/// 1. Remove `<script>` and `<style>` blocks with their content
/// 2. Remove HTML comments
/// 3. Replace block-level tags (`p, div, h1–h6, br, li, tr`) with a newline
/// 4. Strip all remaining tags
/// 5. Collapse runs of spaces/tabs into one space
/// 6. Trim spaces adjacent to each newline
/// 7. Collapse 2+ newlines into one blank line
/// 8. Decode `&nbsp; &quot; &apos; &lt; &gt; &amp;`
/// 9. Trim the result
pub fn normalize(raw: &str) -> String {
    let s = normalise_line_endings(raw);
    let s = remove_script_and_style(&s);
    let s = remove_comments(&s);
    let s = block_tags_to_newlines(&s);
    let s = strip_tags(&s);
    let s = collapse_inline_whitespace(&s);
    let s = trim_around_newlines(&s);
    let s = collapse_newlines(&s);
    let s = decode_entities(&s);
    s.trim().to_string()
}

// ── Rule 0: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 1: Remove script and style blocks ───────────────────────────────────

// A self-closing `<script .../>` has no body; matching it as an opening
// tag would swallow everything up to the next `</script>`.
static RE_SCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b(?:[^>]*/>|[^>]*>.*?</script\s*>)").unwrap()
});
static RE_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b(?:[^>]*/>|[^>]*>.*?</style\s*>)").unwrap());

fn remove_script_and_style(input: &str) -> String {
    let s = RE_SCRIPT.replace_all(input, "");
    RE_STYLE.replace_all(&s, "").into_owned()
}

// ── Rule 2: Remove comments ──────────────────────────────────────────────────

static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

fn remove_comments(input: &str) -> String {
    RE_COMMENT.replace_all(input, "").into_owned()
}

// ── Rule 3: Block-level tags become newlines ─────────────────────────────────

static RE_BLOCK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(?:p|div|h[1-6]|br|li|tr)\b[^>]*>").unwrap());

fn block_tags_to_newlines(input: &str) -> String {
    RE_BLOCK_TAG.replace_all(input, "\n").into_owned()
}

// ── Rule 4: Strip remaining tags ─────────────────────────────────────────────

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

fn strip_tags(input: &str) -> String {
    RE_TAG.replace_all(input, "").into_owned()
}

// ── Rule 5: Collapse inline whitespace ───────────────────────────────────────

static RE_INLINE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

fn collapse_inline_whitespace(input: &str) -> String {
    RE_INLINE_WS.replace_all(input, " ").into_owned()
}

// ── Rule 6: Trim spaces around newlines ──────────────────────────────────────

static RE_NEWLINE_PAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*\n[ \t]*").unwrap());

fn trim_around_newlines(input: &str) -> String {
    RE_NEWLINE_PAD.replace_all(input, "\n").into_owned()
}

// ── Rule 7: Collapse blank lines ─────────────────────────────────────────────

static RE_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());

fn collapse_newlines(input: &str) -> String {
    RE_NEWLINES.replace_all(input, "\n\n").into_owned()
}

// ── Rule 8: Decode named entities ────────────────────────────────────────────

fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn paragraph_with_inline_markup_and_script() {
        assert_eq!(
            normalize("<p>Hello <b>World</b></p><script>evil()</script>"),
            "Hello World"
        );
    }

    #[test]
    fn script_and_style_span_lines() {
        let input = "<style type=\"text/css\">\np { color: red; }\n</style><p>Text</p><SCRIPT>\nvar x = '<p>';\n</SCRIPT>";
        assert_eq!(normalize(input), "Text");
    }

    #[test]
    fn only_script_and_style_is_empty() {
        assert_eq!(normalize("<style>a{}</style><script>x()</script>"), "");
    }

    #[test]
    fn self_closing_script_keeps_following_text() {
        let input = "<head><script src=\"a.js\"/><style href=\"s.css\"/></head>\
                     <body><p>Body text</p><script>x()</script><p>After</p></body>";
        assert_eq!(normalize(input), "Body text\n\nAfter");
    }

    #[test]
    fn script_src_with_slash_still_has_a_body() {
        let input = "<script src=\"js/a.js\">var t = '</p>';</script><p>Kept</p>";
        assert_eq!(normalize(input), "Kept");
    }

    #[test]
    fn comments_are_removed() {
        assert_eq!(normalize("a<!-- one\n<p>two</p> -->b"), "ab");
    }

    #[test]
    fn block_tags_make_paragraphs() {
        let input = "<h1>Title</h1><p>First   para.</p>\n\n\n<p>Second\tpara.</p>";
        assert_eq!(normalize(input), "Title\n\nFirst para.\n\nSecond para.");
    }

    #[test]
    fn br_and_attributes() {
        assert_eq!(normalize("one<br/>two<br class=\"x\">three"), "one\ntwo\nthree");
        assert_eq!(normalize("<div class=\"c\">a</div><li id=1>b</li>"), "a\n\nb");
    }

    #[test]
    fn pre_is_not_mistaken_for_p() {
        assert_eq!(normalize("a<pre>b</pre>c"), "abc");
    }

    #[test]
    fn spaces_next_to_newlines_are_trimmed() {
        assert_eq!(normalize("<p> a </p> <p> b </p>"), "a\n\nb");
    }

    #[test]
    fn entities_decode_once_with_ampersand_last() {
        assert_eq!(normalize("&amp;lt;"), "&lt;");
        assert_eq!(
            normalize("&quot;x&quot; &apos;y&apos; &lt;z&gt; a&nbsp;b &amp;"),
            "\"x\" 'y' <z> a b &"
        );
    }

    #[test]
    fn decoded_angle_brackets_are_not_stripped() {
        assert_eq!(normalize("<p>if a &lt; b &gt; c</p>"), "if a < b > c");
    }

    #[test]
    fn crlf_is_normalised() {
        assert_eq!(normalize("<p>a</p>\r\n\r\n<p>b</p>"), "a\n\nb");
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
    }

    #[test]
    fn full_xhtml_document() {
        let input = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Head Title</title><link rel="stylesheet" href="s.css"/></head>
<body>
  <h2 class="chapter">Chapter One</h2>
  <p>It was a <em>dark</em> and stormy night.</p>
</body>
</html>"#;
        let text = normalize(input);
        assert!(text.ends_with("Chapter One\n\nIt was a dark and stormy night."), "got {text:?}");
    }

    fn markup() -> impl Strategy<Value = String> {
        let piece = prop_oneof![
            "[a-zA-Z0-9 .,\t\n]{0,12}",
            Just("<p>".to_string()),
            Just("</p>".to_string()),
            Just("<br/>".to_string()),
            Just("<div class=\"x\">".to_string()),
            Just("</div>".to_string()),
            Just("<h2>".to_string()),
            Just("</h2>".to_string()),
            Just("<b>".to_string()),
            Just("</b>".to_string()),
            Just("<span>".to_string()),
            Just("<!-- note -->".to_string()),
            Just("<script>x()</script>".to_string()),
            Just("<style>p{}</style>".to_string()),
            Just("\r\n".to_string()),
        ];
        proptest::collection::vec(piece, 0..24).prop_map(|v| v.concat())
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(input in markup()) {
            let once = normalize(&input);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn output_is_trimmed_with_bounded_blank_lines(input in markup()) {
            let out = normalize(&input);
            prop_assert_eq!(out.trim(), out.as_str());
            prop_assert!(!out.contains("\n\n\n"));
            prop_assert!(!out.contains("  "));
        }
    }
}
