//! Article body handling: picking the text used for previews and rendering
//! the body to HTML.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use serde_json::Value;

use crate::{non_blank, ArticleBody, ContentError};

static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<blockquote\b.*?</blockquote\s*>").expect("blockquote pattern is valid")
});
static HEADING_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<h[1-6]\b[^>]*>").expect("heading pattern is valid"));
static BLOCK_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|h[1-6]|tr|section|article|figure|pre)\s*>")
        .expect("block break pattern is valid")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// A block of a structured editor document.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Heading(u8, String),
    Paragraph(String),
    Quote(String),
}

/// Text fed to the preview heuristic: markdown, else HTML reduced to text
/// lines, else the structured document's text. `None` when the body is empty.
pub fn preview_source(body: &ArticleBody) -> Option<String> {
    if let Some(markdown) = non_blank(body.markdown.as_deref()) {
        return Some(markdown.to_string());
    }
    if let Some(html) = non_blank(body.html.as_deref()) {
        return Some(html_to_text(html));
    }
    let blocks = parse_document(body.document.as_deref())?;
    let lines = blocks
        .into_iter()
        .map(|block| match block {
            Block::Heading(_, text) => format!("# {text}"),
            Block::Paragraph(text) => text,
            Block::Quote(text) => format!("> {text}"),
        })
        .collect::<Vec<_>>();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// HTML for the article page: stored HTML, else rendered markdown, else the
/// structured document. Empty string when there is no body.
pub fn render_body_html(body: &ArticleBody) -> String {
    if let Some(html) = non_blank(body.html.as_deref()) {
        return html.to_string();
    }
    if let Some(markdown) = non_blank(body.markdown.as_deref()) {
        return render_markdown(markdown);
    }
    let Some(blocks) = parse_document(body.document.as_deref()) else {
        return String::new();
    };

    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Heading(level, text) => {
                out.push_str(&format!("<h{level}>{}</h{level}>\n", escape_html(&text)));
            },
            Block::Paragraph(text) => {
                out.push_str(&format!("<p>{}</p>\n", escape_html(&text)));
            },
            Block::Quote(text) => {
                out.push_str(&format!("<blockquote><p>{}</p></blockquote>\n", escape_html(&text)));
            },
        }
    }
    out
}

pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Check a structured-document field before it is written to the store.
pub fn validate_document(raw: &str) -> Result<(), ContentError> {
    let value: Value = serde_json::from_str(raw).map_err(|err| {
        ContentError::validation("structured document", format!("not valid JSON: {err}"))
    })?;
    if !value.is_object() {
        return Err(ContentError::validation(
            "structured document",
            "expected a JSON object at the top level",
        ));
    }
    Ok(())
}

fn parse_document(raw: Option<&str>) -> Option<Vec<Block>> {
    let raw = non_blank(raw)?;
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("ignoring malformed structured document: {err}");
            return None;
        },
    };
    let mut blocks = Vec::new();
    collect_blocks(&value, &mut blocks);
    Some(blocks)
}

fn collect_blocks(node: &Value, out: &mut Vec<Block>) {
    let kind = node.get("type").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "heading" => {
            let level = node
                .pointer("/attrs/level")
                .and_then(Value::as_u64)
                .map(|level| level.clamp(1, 6) as u8)
                .unwrap_or(2);
            push_text(out, inline_text(node), |text| Block::Heading(level, text));
        },
        "paragraph" => push_text(out, inline_text(node), Block::Paragraph),
        "blockquote" => {
            for child in children(node) {
                push_text(out, inline_text(child), Block::Quote);
            }
        },
        "image" | "codeBlock" | "horizontalRule" => {},
        _ => {
            for child in children(node) {
                collect_blocks(child, out);
            }
        },
    }
}

fn push_text(out: &mut Vec<Block>, text: String, build: impl FnOnce(String) -> Block) {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if !text.is_empty() {
        out.push(build(text));
    }
}

fn children(node: &Value) -> impl Iterator<Item = &Value> {
    node.get("content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn inline_text(node: &Value) -> String {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        return text.to_string();
    }
    if node.get("type").and_then(Value::as_str) == Some("hardBreak") {
        return " ".to_string();
    }
    children(node).map(inline_text).collect()
}

/// Reduce stored HTML to the line-oriented text the preview heuristic reads.
fn html_to_text(html: &str) -> String {
    let text = BLOCKQUOTE.replace_all(html, "\n");
    let text = HEADING_OPEN.replace_all(&text, "\n# ");
    let text = BLOCK_BREAK.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, "");
    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::{derive_preview, PreviewOptions};

    const DOCUMENT: &str = r#"{
        "type": "doc",
        "content": [
            {"type": "heading", "attrs": {"level": 1},
                "content": [{"type": "text", "text": "Title"}]},
            {"type": "blockquote", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "Quoted."}]}
            ]},
            {"type": "image", "attrs": {"src": "x.png"}},
            {"type": "paragraph", "content": [
                {"type": "text", "text": "Fish & chips"},
                {"type": "hardBreak"},
                {"type": "text", "text": "for <two>."}
            ]}
        ]
    }"#;

    fn body(markdown: Option<&str>, html: Option<&str>, document: Option<&str>) -> ArticleBody {
        ArticleBody {
            markdown: markdown.map(str::to_string),
            html: html.map(str::to_string),
            document: document.map(str::to_string),
        }
    }

    #[test]
    fn markdown_wins_as_preview_source() {
        let source = preview_source(&body(Some("Hello."), Some("<p>Ignored.</p>"), None));
        assert_eq!(source.as_deref(), Some("Hello."));
    }

    #[test]
    fn html_is_reduced_to_lines() {
        let html = "<h2>Heading</h2><blockquote><p>Quote.</p></blockquote><p>First &amp; \
                    best.</p><p><img src=\"a.png\"></p><p>Second.</p>";
        let source = preview_source(&body(None, Some(html), None)).expect("html source");
        assert_eq!(derive_preview(&source, &PreviewOptions::default()), "First & best. Second.");
    }

    #[test]
    fn structured_document_text_is_extracted() {
        let source = preview_source(&body(None, None, Some(DOCUMENT))).expect("document source");
        assert_eq!(source, "# Title\n> Quoted.\nFish & chips for <two>.");
        assert_eq!(
            derive_preview(&source, &PreviewOptions::default()),
            "Fish & chips for <two>."
        );
    }

    #[test]
    fn empty_or_malformed_bodies_have_no_source() {
        assert_eq!(preview_source(&ArticleBody::default()), None);
        assert_eq!(preview_source(&body(Some("  "), None, Some("{not json"))), None);
        assert_eq!(render_body_html(&body(None, None, Some("{not json"))), "");
    }

    #[test]
    fn render_prefers_stored_html_then_markdown() {
        assert_eq!(
            render_body_html(&body(Some("*x*"), Some("<p>stored</p>"), None)),
            "<p>stored</p>"
        );
        assert_eq!(
            render_body_html(&body(Some("Some *intro*."), None, None)),
            "<p>Some <em>intro</em>.</p>\n"
        );
    }

    #[test]
    fn render_structured_document_escapes_text() {
        let html = render_body_html(&body(None, None, Some(DOCUMENT)));
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<blockquote><p>Quoted.</p></blockquote>"));
        assert!(html.contains("<p>Fish &amp; chips for &lt;two&gt;.</p>"));
    }

    #[test]
    fn document_validation_rejects_bad_json() {
        assert!(validate_document(DOCUMENT).is_ok());
        let err = validate_document("{\"type\": ").expect_err("truncated json");
        assert!(matches!(err, ContentError::Validation { .. }));
        assert!(validate_document("[1, 2]").is_err());
    }
}
