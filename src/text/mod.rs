//! Chapter markup → plain text.
//!
//! The output is one paragraph per block element, separated by blank
//! lines, with list items prefixed by `"- "`. Scripts, styles, navigation
//! blocks and anything hidden through inline CSS or a `hidden` class are
//! dropped before the walk.

mod cleanup;

pub use cleanup::{DUPLICATE_WINDOW, clean_header_lines};

use crate::dom::{ArenaDom, ArenaNodeData, ArenaNodeId, parse_html};
use crate::util::collapse_whitespace;

/// Separator placed between output lines.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

const NOISE_TAGS: &[&str] = &["script", "style", "head", "nav"];

const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "ul",
    "ol",
    "blockquote",
    "article",
    "section",
    "pre",
];

/// Convert chapter markup to cleaned plain text.
///
/// ```
/// let text = chapterize::html_to_text("<ul><li>One</li><li>Two &amp; three</li></ul>");
/// assert_eq!(text, "- One\n\n- Two & three");
/// ```
pub fn html_to_text(html: &str) -> String {
    let mut lines = html_to_lines(html);
    clean_header_lines(&mut lines);
    lines.join(PARAGRAPH_SEPARATOR)
}

/// Flatten markup into trimmed, non-empty lines, before header cleanup.
pub fn html_to_lines(html: &str) -> Vec<String> {
    if html.is_empty() {
        return Vec::new();
    }

    let mut dom = parse_html(html);
    let root = dom.body_or_root();
    remove_noise(&mut dom, root);

    let mut buf = String::with_capacity(html.len() / 2);
    flatten(&dom, root, &mut buf);

    buf.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Detach every noise node below `root`.
fn remove_noise(dom: &mut ArenaDom, root: ArenaNodeId) {
    let noise: Vec<ArenaNodeId> = {
        let dom: &ArenaDom = dom;
        dom.descendants(root).filter(|&id| is_noise(dom, id)).collect()
    };
    for id in noise {
        dom.detach(id);
    }
}

fn is_noise(dom: &ArenaDom, id: ArenaNodeId) -> bool {
    let Some(tag) = dom.element_name(id) else {
        return false;
    };
    if NOISE_TAGS.contains(&tag.as_ref()) {
        return true;
    }

    let hidden_style = dom.get_attr(id, "style").is_some_and(|style| {
        let style = style.to_ascii_lowercase();
        style.contains("display:none") || style.contains("visibility:hidden")
    });
    let hidden_class = dom
        .get_attr(id, "class")
        .is_some_and(|class| class.to_ascii_lowercase().contains("hidden"));

    hidden_style || hidden_class
}

fn flatten(dom: &ArenaDom, id: ArenaNodeId, buf: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        ArenaNodeData::Text(text) => {
            let text = collapse_whitespace(text);
            if !text.trim().is_empty() {
                buf.push_str(&text);
            }
        }
        ArenaNodeData::Element { name, .. } => {
            let tag = name.local.as_ref();
            let is_block = BLOCK_TAGS.contains(&tag);

            if is_block && !buf.is_empty() && !buf.ends_with('\n') {
                buf.push('\n');
            }
            if tag == "li" {
                buf.push_str("- ");
            }

            for child in dom.children(id) {
                flatten(dom, child, buf);
            }

            if is_block {
                buf.push('\n');
            }
            if tag == "br" {
                buf.push('\n');
            }
        }
        ArenaNodeData::Document => {
            for child in dom.children(id) {
                flatten(dom, child, buf);
            }
        }
        ArenaNodeData::Comment(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(html_to_text(""), "");
        assert!(html_to_lines("").is_empty());
    }

    #[test]
    fn test_extracts_body_text_only() {
        let html = r#"
<!DOCTYPE html>
<html>
<head><title>0</title></head>
<body>
<p>Hello World</p>
</body>
</html>"#;

        let text = html_to_text(html);
        assert_eq!(text, "Hello World");
    }

    #[test]
    fn test_removes_script_and_style() {
        let html = r#"
<body>
<script>alert('test');</script>
<style>.hidden { display: none; }</style>
<p>Visible content</p>
<nav><a href="next.xhtml">Next chapter</a></nav>
</body>"#;

        let text = html_to_text(html);
        assert_eq!(text, "Visible content");
    }

    #[test]
    fn test_removes_hidden_elements() {
        let html = r#"
<body>
<div style="color: red; DISPLAY:NONE">Hidden by style <b>and nested</b></div>
<p style="visibility:hidden">Invisible</p>
<span class="note Hidden-Text">Hidden by class</span>
<p>Visible text</p>
</body>"#;

        let text = html_to_text(html);
        assert_eq!(text, "Visible text");
    }

    #[test]
    fn test_spaced_display_none_is_not_matched() {
        // Only the compact spelling counts as hidden.
        let text = html_to_text(r#"<p style="display: none">Still here</p>"#);
        assert_eq!(text, "Still here");
    }

    #[test]
    fn test_decodes_entities() {
        let text = html_to_text("<body><p>Test &amp; Demo &lt;html&gt;</p></body>");
        assert_eq!(text, "Test & Demo <html>");
    }

    #[test]
    fn test_vietnamese_text_is_preserved() {
        let html = r#"
<body>
<p>Chương 1: Hắn chính là một viên tro bụi</p>
<p>Đọc truyện và tham gia tu tiên</p>
</body>"#;

        let text = html_to_text(html);
        assert_eq!(
            text,
            "Chương 1: Hắn chính là một viên tro bụi\n\nĐọc truyện và tham gia tu tiên"
        );
    }

    #[test]
    fn test_list_items_get_markers() {
        let html = "<body><ul>\n<li>Item 1</li>\n<li>Item 2</li>\n</ul></body>";
        assert_eq!(html_to_lines(html), vec!["- Item 1", "- Item 2"]);
    }

    #[test]
    fn test_br_breaks_lines() {
        let html = "<body><p>Line 1<br/>Line 2</p></body>";
        assert_eq!(html_to_lines(html), vec!["Line 1", "Line 2"]);
    }

    #[test]
    fn test_inline_elements_stay_on_one_line() {
        let html = "<p>A <em>very</em> bold\n   <strong>claim</strong>.</p>";
        assert_eq!(html_to_lines(html), vec!["A very bold claim."]);
    }

    #[test]
    fn test_nested_blocks_do_not_double_break() {
        let html = "<div><section><h2>Title</h2><p>Body text</p></section></div>";
        let text = html_to_text(html);
        assert_eq!(text, "Title\n\nBody text");
    }

    #[test]
    fn test_leading_page_numbers_removed() {
        let html = "<body><p>0</p><p>123</p><p>Actual content here</p></body>";
        assert_eq!(html_to_text(html), "Actual content here");
    }

    #[test]
    fn test_duplicate_title_collapsed() {
        let html = r#"
<body>
<h1>Chapter Title</h1>
<p>Some junk text</p>
<p>Chapter Title</p>
<p>Actual content</p>
</body>"#;

        assert_eq!(html_to_text(html), "Chapter Title\n\nActual content");
    }

    fn xhtml_chapter(head: &str, body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>{head}</head>
<body>{body}</body>
</html>"#
        )
    }

    #[test]
    fn test_xhtml_empty_head_elements_keep_body() {
        let body = "<h1>Chapter One</h1><p>The caravan reached the oasis two days later than planned.</p>";
        let expected = "Chapter One\n\nThe caravan reached the oasis two days later than planned.";

        let empty_title = xhtml_chapter("<title/>", body);
        assert_eq!(html_to_text(&empty_title), expected);

        let empty_script = xhtml_chapter(r#"<script type="text/javascript" src="a.js"/>"#, body);
        assert_eq!(html_to_text(&empty_script), expected);
    }

    #[test]
    fn test_xhtml_empty_hidden_div_hides_nothing_else() {
        let html = xhtml_chapter(
            "<title>x</title>",
            r#"<p><a id="p5"/>First para text.</p><div class="hidden"/><p>Second para visible.</p>"#,
        );
        assert_eq!(html_to_text(&html), "First para text.\n\nSecond para visible.");
    }

    #[test]
    fn test_whitespace_only_markup_is_empty() {
        assert_eq!(html_to_text("<body>\n  <div> \t </div>\n</body>"), "");
    }
}
