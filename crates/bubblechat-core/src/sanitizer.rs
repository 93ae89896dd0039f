//! Markdown-to-plain-text cleanup for backend replies.
//!
//! The backend answers in chat-style Markdown with the odd HTML fragment mixed
//! in, but a chat bubble shows plain text only. `sanitize` runs a fixed, ordered
//! list of regex stages over the reply. It is an approximation of a Markdown
//! renderer, not a parser: nested or malformed markup can come out imperfect.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// One pure text-to-text step of the pipeline.
pub type Stage = fn(&str) -> String;

/// Stages in the order they run. Later stages assume the earlier ones already
/// ran (italic after bold, list markers after inline markup, etc).
pub const PIPELINE: [Stage; 13] = [
    replace_line_breaks,
    strip_tags,
    decode_entities,
    strip_images,
    collapse_links,
    strip_emphasis,
    strip_code_markers,
    strip_headings,
    strip_block_quotes,
    strip_unordered_markers,
    strip_ordered_markers,
    strip_horizontal_rules,
    trim_lines,
];

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(nbsp|amp|lt|gt|quot|#39|#x2[Ff]);").unwrap());
static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static BOLD_STARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^\n]+?)\*\*").unwrap());
static BOLD_UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__([^\n]+?)__").unwrap());
static ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static ITALIC_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_([^_\n]+)_").unwrap());
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`{1,3}([^`]+)`{1,3}").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#{1,6}[ \t]+").unwrap());
static BLOCK_QUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(?:>[ \t]?)+").unwrap());
static UNORDERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[-*+][ \t]+").unwrap());
static ORDERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\d+\.[ \t]+").unwrap());
static HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t\r]*$").unwrap());

/// Convert a Markdown/HTML-flavoured reply into display-ready plain text.
///
/// Never fails; empty input yields an empty string.
pub fn sanitize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    PIPELINE
        .iter()
        .fold(raw.to_string(), |text, stage| stage(&text))
}

pub fn replace_line_breaks(text: &str) -> String {
    LINE_BREAK.replace_all(text, "\n").into_owned()
}

pub fn strip_tags(text: &str) -> String {
    TAG.replace_all(text, "").into_owned()
}

/// Decode the handful of entities the backend actually emits. Single pass, so
/// `&amp;lt;` becomes `&lt;` and not `<`. Anything else is left alone.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            match &caps[1] {
                "nbsp" => " ",
                "amp" => "&",
                "lt" => "<",
                "gt" => ">",
                "quot" => "\"",
                "#39" => "'",
                _ => "/",
            }
            .to_string()
        })
        .into_owned()
}

pub fn strip_images(text: &str) -> String {
    IMAGE.replace_all(text, "").into_owned()
}

pub fn collapse_links(text: &str) -> String {
    LINK.replace_all(text, "${1}").into_owned()
}

/// Bold has to go first: `*x*` would otherwise eat half of `**x**`.
pub fn strip_emphasis(text: &str) -> String {
    let text = BOLD_STARS.replace_all(text, "${1}");
    let text = BOLD_UNDERSCORES.replace_all(&text, "${1}");
    let text = ITALIC_STAR.replace_all(&text, "${1}");
    ITALIC_UNDERSCORE.replace_all(&text, "${1}").into_owned()
}

pub fn strip_code_markers(text: &str) -> String {
    CODE.replace_all(text, "${1}").into_owned()
}

pub fn strip_headings(text: &str) -> String {
    HEADING.replace_all(text, "").into_owned()
}

pub fn strip_block_quotes(text: &str) -> String {
    BLOCK_QUOTE.replace_all(text, "").into_owned()
}

pub fn strip_unordered_markers(text: &str) -> String {
    UNORDERED.replace_all(text, "").into_owned()
}

pub fn strip_ordered_markers(text: &str) -> String {
    ORDERED.replace_all(text, "").into_owned()
}

pub fn strip_horizontal_rules(text: &str) -> String {
    HORIZONTAL_RULE.replace_all(text, "").into_owned()
}

pub fn trim_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   \n  "), "");
    }

    #[test]
    fn test_plain_text_is_idempotent() {
        let plain = "Hello there.\nHow are you today?";
        let once = sanitize(plain);
        assert_eq!(once, plain);
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(sanitize("**bold**"), "bold");
        assert_eq!(sanitize("**a** and _b_"), "a and b");
        assert_eq!(sanitize("__strong__ *soft*"), "strong soft");
    }

    #[test]
    fn test_italic_pairs_left_to_right() {
        // First `*` pairs with the next one; the trailing star has no partner.
        assert_eq!(sanitize("*it*alic*"), "italic*");
    }

    #[test]
    fn test_headings_and_lists() {
        assert_eq!(
            sanitize("# Title\n- item one\n1. item two"),
            "Title\nitem one\nitem two"
        );
        assert_eq!(sanitize("###### Deep"), "Deep");
        assert_eq!(sanitize("+ plus\n  * nested"), "plus\nnested");
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(sanitize("[click](http://x)"), "click");
        assert_eq!(sanitize("![alt](http://x)"), "");
        assert_eq!(
            sanitize("see ![logo](a.png)[docs](https://d) now"),
            "see docs now"
        );
    }

    #[test]
    fn test_entities() {
        assert_eq!(sanitize("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;tag&gt; &quot;q&quot; it&#39;s a&#x2F;b"), "<tag> \"q\" it's a/b");
        assert_eq!(decode_entities("x&nbsp;y"), "x y");
        assert_eq!(decode_entities("&copy; stays"), "&copy; stays");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_html_tags() {
        assert_eq!(sanitize("one<br>two<BR/>three<br />four"), "one\ntwo\nthree\nfour");
        assert_eq!(sanitize("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn test_code_markers() {
        assert_eq!(sanitize("run `cargo fmt` first"), "run cargo fmt first");
        assert_eq!(sanitize("```\nlet x = 1;\n```"), "let x = 1;");
    }

    #[test]
    fn test_block_quotes() {
        assert_eq!(sanitize("> quoted\n>> deeper\n> > spaced"), "quoted\ndeeper\nspaced");
        // Entities decode before the quote stage runs.
        assert_eq!(sanitize("&gt; escaped quote"), "escaped quote");
    }

    #[test]
    fn test_horizontal_rules() {
        assert_eq!(sanitize("above\n---\nbelow"), "above\n\nbelow");
        assert_eq!(sanitize("***\n___"), "");
    }

    #[test]
    fn test_lines_are_trimmed() {
        assert_eq!(sanitize("  padded  \n\tline\t"), "padded\nline");
    }

    #[test]
    fn test_stages_run_in_order() {
        assert_eq!(PIPELINE.len(), 13);
        // `<br>` must become a newline before tags are stripped.
        let text = PIPELINE[1](&PIPELINE[0]("a<br>b"));
        assert_eq!(text, "a\nb");
    }

    #[test]
    fn test_realistic_reply() {
        let reply = "## Steps\n\n1. Open the **settings** page\n2. Click [Save](https://x.y)\n\n> Note: it&#39;s _quick_.";
        assert_eq!(
            sanitize(reply),
            "Steps\n\nOpen the settings page\nClick Save\n\nNote: it's quick."
        );
    }
}
