//! Markdown-to-HTML renderer for bot messages.
//!
//! Pure, ordered substitution pipeline. Because the widget re-renders the
//! whole accumulated buffer after every fragment, the renderer must derive
//! the full correct HTML from any buffer state; markdown constructs that are
//! still open (an unclosed `**`, a fence missing its closer) simply render
//! literally until the closing delimiter arrives.
//!
//! Escaping runs first, so markdown control characters in untrusted model or
//! document content can never produce executable markup. Code regions are
//! extracted into opaque placeholders before any tag-generating pass and
//! restored verbatim at the end, so nothing inside a code span or fenced
//! block is ever transformed.

use std::sync::LazyLock;

use regex_lite::Regex;

// Private-use sentinels. They cannot survive the escape pass from user
// input, so they are collision-free as internal markers.
const LI_OPEN: &str = "\u{e000}";
const LI_CLOSE: &str = "\u{e001}";
const CODE_OPEN: &str = "\u{e002}";
const CODE_CLOSE: &str = "\u{e003}";

static FENCED_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").unwrap());
static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static BOLD_STARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static BOLD_UNDERSCORES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_]+)__").unwrap());
static H3_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^### (.+)$").unwrap());
static H2_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^## (.+)$").unwrap());
static H1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").unwrap());
// `* ` only opens a list item when not followed by another `*`, so bold at
// the start of a line is left for the emphasis passes.
static LIST_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\* ([^*\n].*)$").unwrap());
static LIST_DASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^- (.+)$").unwrap());
static LIST_NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\d+\. (.+)$").unwrap());
// Single-delimiter emphasis must not span newlines and runs after bold and
// list detection to avoid the `**` / `* ` ambiguity.
static ITALIC_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static ITALIC_UNDERSCORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_\n]+)_").unwrap());
// The `>` was escaped in the first pass, so blockquote lines start `&gt; `.
static BLOCKQUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^&gt; (.+)$").unwrap());
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());
static LIST_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:{LI_OPEN}[\s\S]*?{LI_CLOSE}(?:\n|$))+")).unwrap()
});
static PARAGRAPH_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());
static BR_BEFORE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br>(<(?:ul|li|h[123]|pre|blockquote)>)").unwrap());
static BR_AFTER_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(</(?:ul|li|h[123]|pre|blockquote)>)<br>").unwrap());
static EMPTY_PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<p>\s*</p>").unwrap());
static P_BEFORE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p>(<(?:h[123]|ul|pre|blockquote)>)").unwrap());
static P_AFTER_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(</(?:h[123]|ul|pre|blockquote)>)</p>").unwrap());

/// Escape the three HTML-significant characters. Applied to user text before
/// it is inserted into a cell, and as the renderer's first pass.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Convert accumulated plain text into a sanitized HTML fragment.
///
/// Empty and whitespace-only buffers render to the empty string so a message
/// node never shows a bare paragraph.
pub fn render_markdown(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let mut html = escape_html(text);

    // Capture code regions before any tag-generating pass so their content
    // comes back verbatim.
    let mut fenced_blocks: Vec<String> = Vec::new();
    html = FENCED_CODE_RE
        .replace_all(&html, |caps: &regex_lite::Captures<'_>| {
            let token = format!("{CODE_OPEN}B{}{CODE_CLOSE}", fenced_blocks.len());
            fenced_blocks.push(caps[1].to_string());
            token
        })
        .into_owned();
    let mut inline_spans: Vec<String> = Vec::new();
    html = INLINE_CODE_RE
        .replace_all(&html, |caps: &regex_lite::Captures<'_>| {
            let token = format!("{CODE_OPEN}I{}{CODE_CLOSE}", inline_spans.len());
            inline_spans.push(caps[1].to_string());
            token
        })
        .into_owned();

    html = BOLD_STARS_RE
        .replace_all(&html, "<strong>$1</strong>")
        .into_owned();
    html = BOLD_UNDERSCORES_RE
        .replace_all(&html, "<strong>$1</strong>")
        .into_owned();

    html = H3_RE.replace_all(&html, "<h3>$1</h3>").into_owned();
    html = H2_RE.replace_all(&html, "<h2>$1</h2>").into_owned();
    html = H1_RE.replace_all(&html, "<h1>$1</h1>").into_owned();

    let li_item = format!("{LI_OPEN}$1{LI_CLOSE}");
    html = LIST_STAR_RE.replace_all(&html, li_item.as_str()).into_owned();
    html = LIST_DASH_RE.replace_all(&html, li_item.as_str()).into_owned();
    html = LIST_NUM_RE.replace_all(&html, li_item.as_str()).into_owned();

    html = ITALIC_STAR_RE.replace_all(&html, "<em>$1</em>").into_owned();
    html = ITALIC_UNDERSCORE_RE
        .replace_all(&html, "<em>$1</em>")
        .into_owned();

    html = BLOCKQUOTE_RE
        .replace_all(&html, "<blockquote>$1</blockquote>")
        .into_owned();

    html = LINK_RE
        .replace_all(&html, "<a href=\"$2\" target=\"_blank\">$1</a>")
        .into_owned();

    // Merge consecutive list items into one list; convert any stray marker
    // defensively so no sentinel ever leaks into the output.
    html = LIST_RUN_RE
        .replace_all(&html, |caps: &regex_lite::Captures<'_>| {
            let run = caps[0].replace(LI_OPEN, "<li>").replace(LI_CLOSE, "</li>");
            format!("<ul>{}</ul>", run.trim())
        })
        .into_owned();
    html = html.replace(LI_OPEN, "<li>").replace(LI_CLOSE, "</li>");

    html = PARAGRAPH_BREAK_RE.replace_all(&html, "</p><p>").into_owned();
    html = html.replace('\n', "<br>");

    // Restore code regions now so the block-boundary cleanup below sees the
    // real tags. Their content skipped every pass after escaping.
    for (i, content) in fenced_blocks.iter().enumerate() {
        let token = format!("{CODE_OPEN}B{i}{CODE_CLOSE}");
        html = html.replace(&token, &format!("<pre><code>{content}</code></pre>"));
    }
    for (i, content) in inline_spans.iter().enumerate() {
        let token = format!("{CODE_OPEN}I{i}{CODE_CLOSE}");
        html = html.replace(&token, &format!("<code>{content}</code>"));
    }

    // Line breaks inserted directly against block boundaries are artifacts
    // of the newline pass.
    html = BR_BEFORE_BLOCK_RE.replace_all(&html, "$1").into_owned();
    html = BR_AFTER_BLOCK_RE.replace_all(&html, "$1").into_owned();

    if !html.trim().starts_with('<') {
        html = format!("<p>{html}</p>");
    }
    html = EMPTY_PARAGRAPH_RE.replace_all(&html, "").into_owned();
    html = P_BEFORE_BLOCK_RE.replace_all(&html, "$1").into_owned();
    html = P_AFTER_BLOCK_RE.replace_all(&html, "$1").into_owned();
    html = html.replace("<p><br>", "<p>").replace("<br></p>", "</p>");

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_becomes_one_paragraph() {
        assert_eq!(render_markdown("just plain text"), "<p>just plain text</p>");
    }

    #[test]
    fn empty_and_whitespace_input_render_empty() {
        assert_eq!(render_markdown(""), "");
        assert_eq!(render_markdown("   \n \n  "), "");
    }

    #[test]
    fn html_is_escaped_before_any_transform() {
        assert_eq!(
            render_markdown("<script>alert(1)</script>"),
            "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn ampersands_escape_first() {
        assert_eq!(render_markdown("a & b < c"), "<p>a &amp; b &lt; c</p>");
    }

    #[test]
    fn bold_and_italic_do_not_cross_contaminate() {
        assert_eq!(
            render_markdown("**bold** and *italic*"),
            "<p><strong>bold</strong> and <em>italic</em></p>"
        );
    }

    #[test]
    fn underscore_emphasis_variants() {
        assert_eq!(
            render_markdown("__bold__ and _italic_"),
            "<p><strong>bold</strong> and <em>italic</em></p>"
        );
    }

    #[test]
    fn unclosed_bold_renders_literally() {
        assert_eq!(render_markdown("Hello **wor"), "<p>Hello **wor</p>");
    }

    #[test]
    fn headings_levels_one_to_three() {
        assert_eq!(render_markdown("# Title"), "<h1>Title</h1>");
        assert_eq!(render_markdown("## Sub"), "<h2>Sub</h2>");
        assert_eq!(render_markdown("### Minor"), "<h3>Minor</h3>");
    }

    #[test]
    fn star_list_merges_into_single_ul() {
        assert_eq!(
            render_markdown("* a\n* b\n* c"),
            "<ul><li>a</li><li>b</li><li>c</li></ul>"
        );
    }

    #[test]
    fn dash_and_numbered_items_join_the_same_run() {
        assert_eq!(
            render_markdown("- first\n2. second"),
            "<ul><li>first</li><li>second</li></ul>"
        );
    }

    #[test]
    fn list_between_paragraphs_keeps_clean_boundaries() {
        // The run merge consumes the newline that closed the list, so the
        // trailing paragraph keeps only its closing tag. Same artifact as
        // the sequential pipeline this mirrors.
        assert_eq!(
            render_markdown("intro\n\n* a\n* b\n\noutro"),
            "<p>intro</p><ul><li>a</li><li>b</li></ul>outro</p>"
        );
    }

    #[test]
    fn blockquote_lines_convert_after_escaping() {
        assert_eq!(
            render_markdown("> wise words"),
            "<blockquote>wise words</blockquote>"
        );
    }

    #[test]
    fn links_open_in_new_context() {
        assert_eq!(
            render_markdown("see [docs](https://example.com/a)"),
            "<p>see <a href=\"https://example.com/a\" target=\"_blank\">docs</a></p>"
        );
    }

    #[test]
    fn fenced_code_content_is_never_transformed() {
        assert_eq!(
            render_markdown("```\n**not bold**\n```"),
            "<pre><code>\n**not bold**\n</code></pre>"
        );
    }

    #[test]
    fn inline_code_protects_markdown_characters() {
        assert_eq!(
            render_markdown("use `*args` here"),
            "<p>use <code>*args</code> here</p>"
        );
    }

    #[test]
    fn code_block_content_keeps_newlines_verbatim() {
        assert_eq!(
            render_markdown("```\nline1\nline2\n```"),
            "<pre><code>\nline1\nline2\n</code></pre>"
        );
    }

    #[test]
    fn code_inside_text_is_escaped_but_untransformed() {
        assert_eq!(
            render_markdown("before\n\n```\n<b>&</b>\n```\n\nafter"),
            "<p>before</p><pre><code>\n&lt;b&gt;&amp;&lt;/b&gt;\n</code></pre><p>after</p>"
        );
    }

    #[test]
    fn paragraph_and_line_breaks() {
        assert_eq!(
            render_markdown("one\ntwo\n\nthree"),
            "<p>one<br>two</p><p>three</p>"
        );
    }

    #[test]
    fn heading_followed_by_text_has_no_stray_break() {
        assert_eq!(render_markdown("# Title\nbody"), "<h1>Title</h1>body");
    }

    #[test]
    fn error_annotation_renders_as_second_paragraph() {
        assert_eq!(
            render_markdown("Partial answer\n\nError: rate limited"),
            "<p>Partial answer</p><p>Error: rate limited</p>"
        );
    }

    #[test]
    fn rendering_is_stable_across_superset_buffers() {
        // Re-render-on-every-chunk must converge to the single-shot render.
        let full = "Hello **world**";
        let mut buffer = String::new();
        let mut last = String::new();
        for fragment in ["Hel", "lo **wor", "ld**"] {
            buffer.push_str(fragment);
            last = render_markdown(&buffer);
        }
        assert_eq!(last, render_markdown(full));
        assert_eq!(last, "<p>Hello <strong>world</strong></p>");
    }

    #[test]
    fn repeated_render_of_final_buffer_is_identical() {
        let text = "# T\n\n* a\n* b\n\n`code` and **bold**";
        assert_eq!(render_markdown(text), render_markdown(text));
    }
}
