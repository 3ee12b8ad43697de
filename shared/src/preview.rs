//! Preview snippets derived from article bodies.
//!
//! Used only when an article has neither an explicit preview nor an excerpt.
//! The body is read line by line: block quotes, image-only lines and lines
//! that are nothing but list or quote markers are dropped, heading markers are
//! stripped, and at most [`PreviewOptions::max_lines`] lines are kept. Inline
//! markdown such as emphasis is left untouched.

use once_cell::sync::Lazy;
use regex::Regex;

/// Appended when a preview is cut short.
pub const ELLIPSIS: char = '…';

static IMAGE_MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[!\[[^\]]*\]\([^)]*\)\]\([^)]*\)|!\[[^\]]*\]\([^)]*\)|<img\b[^>]*>")
        .expect("image markup pattern is valid")
});

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-*+]|\d{1,9}[.)])(?:\s+|$)(?:\[[ xX]\](?:\s+|$))?")
        .expect("list marker pattern is valid")
});

/// Thresholds of the preview heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Body lines considered at most.
    pub max_lines: usize,
    /// Sentences kept when the text has sentence punctuation.
    pub sentence_count: usize,
    /// Character cap for the sentence-based preview.
    pub sentence_cap: usize,
    /// Character cap when no sentence boundary is found.
    pub fallback_cap: usize,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            max_lines: 4,
            sentence_count: 2,
            sentence_cap: 170,
            fallback_cap: 150,
        }
    }
}

/// Derive a preview from markdown-ish body text. Pure and deterministic.
pub fn derive_preview(text: &str, options: &PreviewOptions) -> String {
    let lines = qualifying_lines(text, options.max_lines);
    let joined = lines.join(" ");
    let cleaned = collapse_whitespace(&IMAGE_MARKUP.replace_all(&joined, " "));
    if cleaned.is_empty() {
        return String::new();
    }

    let sentences = split_sentences(&cleaned);
    if sentences.is_empty() {
        return truncate_with_ellipsis(&cleaned, options.fallback_cap);
    }

    let picked = sentences
        .into_iter()
        .take(options.sentence_count.max(1))
        .collect::<Vec<_>>()
        .join(" ");
    if picked.chars().count() <= options.sentence_cap {
        return picked;
    }

    let cut: String = picked.chars().take(options.sentence_cap).collect();
    let cut = cut.trim_end();
    if cut.ends_with(is_terminal) {
        cut.to_string()
    } else {
        format!("{cut}{ELLIPSIS}")
    }
}

fn qualifying_lines(text: &str, max_lines: usize) -> Vec<String> {
    let mut prose = Vec::new();
    let mut headings = Vec::new();

    for raw in text.lines() {
        if prose.len() >= max_lines {
            break;
        }
        let line = raw.trim();
        if line.is_empty() || line.starts_with('>') || is_image_only(line) {
            continue;
        }
        if let Some(heading) = heading_text(line) {
            if !heading.is_empty() && headings.len() < max_lines {
                headings.push(heading.to_string());
            }
            continue;
        }
        let stripped = strip_block_markers(line);
        if stripped.is_empty() || is_image_only(stripped) {
            continue;
        }
        prose.push(stripped.to_string());
    }

    // Heading text stands in only for bodies without any prose.
    if prose.is_empty() {
        headings
    } else {
        prose
    }
}

fn is_image_only(line: &str) -> bool {
    IMAGE_MARKUP.is_match(line) && IMAGE_MARKUP.replace_all(line, "").trim().is_empty()
}

/// Text of an ATX heading (`## Title ##` → `Title`), `None` for other lines.
fn heading_text(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches('#');
    let level = line.len() - rest.len();
    if level == 0 || level > 6 {
        return None;
    }
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    let closed = text.trim_end_matches('#');
    if closed.is_empty() || closed.ends_with(char::is_whitespace) {
        Some(closed.trim_end())
    } else {
        Some(text)
    }
}

fn strip_block_markers(line: &str) -> &str {
    let mut current = line.trim();
    loop {
        if is_thematic_break(current) {
            return "";
        }
        let next = if let Some(rest) = current.strip_prefix('>') {
            rest.trim_start()
        } else if let Some(found) = LIST_MARKER.find(current) {
            current[found.end()..].trim_start()
        } else {
            return current;
        };
        current = next;
    }
}

fn is_thematic_break(line: &str) -> bool {
    let compact: Vec<char> = line.chars().filter(|ch| !ch.is_whitespace()).collect();
    compact.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|marker| compact.iter().all(|ch| ch == marker))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_terminal(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | '。' | '！' | '？')
}

fn is_closing(ch: char) -> bool {
    matches!(ch, '"' | '\'' | ')' | ']' | '*' | '_' | '”' | '’' | '»')
}

/// Complete sentences of `text`, in order. Text after the last terminal
/// punctuation mark is not a sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if !is_terminal(ch) {
            continue;
        }
        let mut end = text.len();
        while let Some(&(idx, next)) = chars.peek() {
            if is_terminal(next) || is_closing(next) {
                chars.next();
                continue;
            }
            end = idx;
            break;
        }
        let at_boundary = end == text.len() || text[end..].starts_with(char::is_whitespace);
        if !at_boundary {
            continue;
        }
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = end;
    }

    sentences
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}{ELLIPSIS}", truncated.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview(text: &str) -> String {
        derive_preview(text, &PreviewOptions::default())
    }

    #[test]
    fn keeps_first_two_sentences_and_drops_heading_and_images() {
        let body = "# Title\n\nSome *intro* sentence. Second sentence here.\n\n\
                    ![img](x.png)\n\nMore text.";
        assert_eq!(preview(body), "Some *intro* sentence. Second sentence here.");
    }

    #[test]
    fn heading_text_is_used_when_body_has_no_prose() {
        assert_eq!(preview("## Coming soon ##\n\n![cover](c.png)"), "Coming soon");
        assert_eq!(preview("#hashtag line. Another one."), "#hashtag line. Another one.");
    }

    #[test]
    fn drops_quotes_markers_and_inline_images() {
        let body = "> A pull quote that should vanish.\n- \n* First point ![icon](i.png) \
                    matters.\n1. Second   point.\n---\n";
        assert_eq!(preview(body), "First point matters. Second point.");
    }

    #[test]
    fn only_first_four_lines_are_considered() {
        let body = "one\ntwo\nthree\nfour\nfive. six.";
        assert_eq!(preview(body), "one two three four");
    }

    #[test]
    fn long_sentences_are_capped_with_ellipsis() {
        let sentence = format!("{}.", "wordy ".repeat(60).trim_end());
        let result = preview(&sentence);
        assert_eq!(result.chars().count(), 171);
        assert!(result.ends_with(ELLIPSIS));
        assert!(!result.contains("  "));
    }

    #[test]
    fn cut_ending_on_terminal_punctuation_has_no_ellipsis() {
        let first = format!("{}.", "a".repeat(169));
        let body = format!("{first} Next sentence.");
        assert_eq!(preview(&body), first);
    }

    #[test]
    fn text_without_sentences_falls_back_to_character_cap() {
        let body = "x".repeat(400);
        let result = preview(&body);
        assert_eq!(result.chars().count(), 151);
        assert!(result.ends_with(ELLIPSIS));

        assert_eq!(preview("version 3.5 is out"), "version 3.5 is out");
    }

    #[test]
    fn image_only_and_empty_bodies_yield_empty_preview() {
        assert_eq!(preview(""), "");
        assert_eq!(preview("![a](a.png)\n[![b](b.png)](https://example.com)\n> quote"), "");
    }

    #[test]
    fn thresholds_are_configurable() {
        let options = PreviewOptions {
            sentence_count: 1,
            ..PreviewOptions::default()
        };
        assert_eq!(derive_preview("First. Second. Third.", &options), "First.");
    }

    #[test]
    fn derivation_is_deterministic() {
        let body = "Alpha beta! Gamma? Delta.\n\n- list item";
        assert_eq!(preview(body), preview(body));
        assert_eq!(preview(body), "Alpha beta! Gamma?");
    }
}
