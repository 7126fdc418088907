//! Restricted markdown-to-HTML renderer for narrative text
//!
//! The narrative provider is instructed to emit a small subset: `#`/`##`/
//! `###` headers, `**bold**`, `*italic*`, `` `code` ``, `-` and numbered
//! list items, and blank-line-separated paragraphs. Anything outside the
//! subset passes through as escaped text.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("invalid bold regex"));
static RE_ITALIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^*]+)\*").expect("invalid italic regex"));
static RE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("invalid code regex"));
static RE_NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s+(.*)$").expect("invalid numbered-item regex"));

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Inline formatting on an already-escaped line. Bold runs first so that
/// `**` pairs are consumed before the italic pass sees single stars.
fn apply_inline(line: &str) -> String {
    let formatted = RE_BOLD.replace_all(line, "<strong>$1</strong>");
    let formatted = RE_ITALIC.replace_all(&formatted, "<em>$1</em>");
    RE_CODE.replace_all(&formatted, "<code>$1</code>").into_owned()
}

#[derive(PartialEq, Clone, Copy)]
enum ListKind {
    Bullet,
    Numbered,
}

/// Render narrative markdown into an HTML fragment.
pub fn render_markdown(text: &str) -> String {
    let mut html = String::new();
    let mut open_list: Option<ListKind> = None;
    let mut paragraph: Vec<String> = Vec::new();

    let close_list = |html: &mut String, open_list: &mut Option<ListKind>| {
        match open_list.take() {
            Some(ListKind::Bullet) => html.push_str("</ul>\n"),
            Some(ListKind::Numbered) => html.push_str("</ol>\n"),
            None => {}
        }
    };
    let close_paragraph = |html: &mut String, paragraph: &mut Vec<String>| {
        if !paragraph.is_empty() {
            html.push_str("<p>");
            html.push_str(&paragraph.join("<br />"));
            html.push_str("</p>\n");
            paragraph.clear();
        }
    };

    for raw_line in text.lines() {
        let line = raw_line.trim_end();
        let escaped = escape_html(line.trim_start());

        if line.trim().is_empty() {
            close_list(&mut html, &mut open_list);
            close_paragraph(&mut html, &mut paragraph);
            continue;
        }

        // Most specific header first, like the reference renderer.
        if let Some(rest) = escaped.strip_prefix("### ") {
            close_list(&mut html, &mut open_list);
            close_paragraph(&mut html, &mut paragraph);
            html.push_str(&format!("<h3>{}</h3>\n", apply_inline(rest)));
            continue;
        }
        if let Some(rest) = escaped.strip_prefix("## ") {
            close_list(&mut html, &mut open_list);
            close_paragraph(&mut html, &mut paragraph);
            html.push_str(&format!("<h2>{}</h2>\n", apply_inline(rest)));
            continue;
        }
        if let Some(rest) = escaped.strip_prefix("# ") {
            close_list(&mut html, &mut open_list);
            close_paragraph(&mut html, &mut paragraph);
            html.push_str(&format!("<h1>{}</h1>\n", apply_inline(rest)));
            continue;
        }

        if let Some(rest) = escaped.strip_prefix("- ") {
            close_paragraph(&mut html, &mut paragraph);
            if open_list != Some(ListKind::Bullet) {
                close_list(&mut html, &mut open_list);
                html.push_str("<ul>\n");
                open_list = Some(ListKind::Bullet);
            }
            html.push_str(&format!("<li>{}</li>\n", apply_inline(rest)));
            continue;
        }

        if let Some(captures) = RE_NUMBERED.captures(&escaped) {
            close_paragraph(&mut html, &mut paragraph);
            if open_list != Some(ListKind::Numbered) {
                close_list(&mut html, &mut open_list);
                html.push_str("<ol>\n");
                open_list = Some(ListKind::Numbered);
            }
            html.push_str(&format!("<li>{}</li>\n", apply_inline(&captures[1])));
            continue;
        }

        close_list(&mut html, &mut open_list);
        paragraph.push(apply_inline(&escaped));
    }

    close_list(&mut html, &mut open_list);
    close_paragraph(&mut html, &mut paragraph);

    html.trim_end().to_string()
}
