//! Markdown post-processing for polished notes
//!
//! Converts the Markdown returned by the polish call into rich-text
//! HTML markup, and extracts a note title from the result.

use regex::Regex;
use std::sync::LazyLock;

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static ORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s+").unwrap());

/// Extract a title from polished Markdown.
///
/// Scans for the first heading-marked line; falls back to the first
/// line between 3 and 60 characters that is not a list item. Returns
/// None when neither exists, in which case the caller leaves the
/// title unchanged.
pub fn extract_title(markdown: &str) -> Option<String> {
    for line in markdown.lines() {
        let trimmed = line.trim();
        if let Some(heading) = heading_text(trimmed) {
            if !heading.is_empty() {
                return Some(heading);
            }
        }
    }

    for line in markdown.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_list_item(trimmed) {
            continue;
        }
        let len = trimmed.chars().count();
        if (3..=60).contains(&len) {
            return Some(strip_inline(trimmed));
        }
    }

    None
}

/// Convert polished Markdown into rich-text HTML markup.
///
/// Line-based: headings, bulleted and numbered lists, and paragraphs,
/// with bold/italic/code inline spans. Input is HTML-escaped before
/// markup is applied.
pub fn to_html(markdown: &str) -> String {
    let mut out = String::new();
    let mut list: Option<&'static str> = None; // "ul" | "ol"
    let mut paragraph: Vec<String> = Vec::new();

    let close_list = |out: &mut String, list: &mut Option<&'static str>| {
        if let Some(tag) = list.take() {
            out.push_str(&format!("</{}>\n", tag));
        }
    };
    let flush_paragraph = |out: &mut String, paragraph: &mut Vec<String>| {
        if !paragraph.is_empty() {
            out.push_str(&format!("<p>{}</p>\n", paragraph.join(" ")));
            paragraph.clear();
        }
    };

    for line in markdown.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush_paragraph(&mut out, &mut paragraph);
            close_list(&mut out, &mut list);
            continue;
        }

        if let Some((level, text)) = heading_line(trimmed) {
            flush_paragraph(&mut out, &mut paragraph);
            close_list(&mut out, &mut list);
            out.push_str(&format!(
                "<h{level}>{}</h{level}>\n",
                render_inline(&text),
                level = level
            ));
            continue;
        }

        if let Some(item) = bullet_item(trimmed) {
            flush_paragraph(&mut out, &mut paragraph);
            if list != Some("ul") {
                close_list(&mut out, &mut list);
                out.push_str("<ul>\n");
                list = Some("ul");
            }
            out.push_str(&format!("<li>{}</li>\n", render_inline(item)));
            continue;
        }

        if let Some(m) = ORDERED_ITEM.find(trimmed) {
            flush_paragraph(&mut out, &mut paragraph);
            if list != Some("ol") {
                close_list(&mut out, &mut list);
                out.push_str("<ol>\n");
                list = Some("ol");
            }
            out.push_str(&format!("<li>{}</li>\n", render_inline(&trimmed[m.end()..])));
            continue;
        }

        close_list(&mut out, &mut list);
        paragraph.push(render_inline(trimmed));
    }

    flush_paragraph(&mut out, &mut paragraph);
    close_list(&mut out, &mut list);

    out.trim_end().to_string()
}

fn heading_line(line: &str) -> Option<(usize, String)> {
    if !line.starts_with('#') {
        return None;
    }
    let level = line.chars().take_while(|&c| c == '#').count();
    if level > 6 {
        return None;
    }
    let rest = line[level..].trim().trim_end_matches('#').trim();
    Some((level, rest.to_string()))
}

fn heading_text(line: &str) -> Option<String> {
    heading_line(line).map(|(_, text)| strip_inline(&text))
}

fn bullet_item(line: &str) -> Option<&str> {
    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim_start());
        }
    }
    None
}

fn is_list_item(line: &str) -> bool {
    bullet_item(line).is_some() || ORDERED_ITEM.is_match(line)
}

fn render_inline(text: &str) -> String {
    let escaped = escape_html(text);
    let bolded = BOLD.replace_all(&escaped, "<strong>$1</strong>");
    let italicized = ITALIC.replace_all(&bolded, "<em>$1</em>");
    CODE.replace_all(&italicized, "<code>$1</code>").into_owned()
}

/// Remove inline markers from a line used as a plain-text title.
fn strip_inline(text: &str) -> String {
    text.replace("**", "").replace('*', "").replace('`', "")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_from_first_heading() {
        let md = "# Meeting Notes\n\nDiscussion...";
        assert_eq!(extract_title(md), Some("Meeting Notes".to_string()));
    }

    #[test]
    fn title_prefers_heading_over_earlier_plain_line() {
        let md = "Some preamble text here\n## Standup\n- item";
        assert_eq!(extract_title(md), Some("Standup".to_string()));
    }

    #[test]
    fn title_falls_back_to_plain_line() {
        let md = "Quick standup summary\n\nmore text";
        assert_eq!(extract_title(md), Some("Quick standup summary".to_string()));
    }

    #[test]
    fn title_fallback_skips_list_items() {
        let md = "- first item\n* second item\n1. third item";
        assert_eq!(extract_title(md), None);
    }

    #[test]
    fn title_fallback_skips_out_of_range_lines() {
        let long = "x".repeat(61);
        let md = format!("ab\n{}\nA usable line\n", long);
        assert_eq!(extract_title(&md), Some("A usable line".to_string()));
    }

    #[test]
    fn title_strips_inline_markers() {
        let md = "# **Weekly** sync";
        assert_eq!(extract_title(md), Some("Weekly sync".to_string()));
    }

    #[test]
    fn html_headings_and_paragraphs() {
        let html = to_html("# Title\n\nHello world");
        assert_eq!(html, "<h1>Title</h1>\n<p>Hello world</p>");
    }

    #[test]
    fn html_bullet_list() {
        let html = to_html("- one\n- two");
        assert_eq!(html, "<ul>\n<li>one</li>\n<li>two</li>\n</ul>");
    }

    #[test]
    fn html_ordered_list() {
        let html = to_html("1. one\n2. two");
        assert_eq!(html, "<ol>\n<li>one</li>\n<li>two</li>\n</ol>");
    }

    #[test]
    fn html_inline_spans() {
        let html = to_html("this is **bold** and *italic* and `code`");
        assert_eq!(
            html,
            "<p>this is <strong>bold</strong> and <em>italic</em> and <code>code</code></p>"
        );
    }

    #[test]
    fn html_escapes_markup() {
        let html = to_html("a < b & c > d");
        assert_eq!(html, "<p>a &lt; b &amp; c &gt; d</p>");
    }

    #[test]
    fn html_adjacent_paragraph_lines_join() {
        let html = to_html("line one\nline two\n\nline three");
        assert_eq!(html, "<p>line one line two</p>\n<p>line three</p>");
    }
}
