//! Comment location and marker mining.
//!
//! Comments are located with the language's comment pattern, skipping
//! matches that start inside a string literal on the same line. The mined
//! markers (TODO/FIXME/HACK/NOTE/XXX) and `@key: value` annotations are kept
//! apart from the dependency graph.

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::{Annotation, CommentInfo, CommentKind, TodoInfo};
use crate::parser::LineIndex;

lazy_static! {
    /// Pattern to match TODO-style markers, with an optional `(owner)` tag.
    static ref TODO_PATTERN: Regex = Regex::new(
        r"\b(TODO|FIXME|HACK|NOTE|XXX)\b(?:\([^)]*\))?\s*:?\s*(.*)"
    ).unwrap();

    /// Pattern to match `@key: value` annotations.
    static ref ANNOTATION_PATTERN: Regex = Regex::new(
        r"@(?P<key>[A-Za-z][\w-]*)\s*:\s*(?P<value>.+)"
    ).unwrap();
}

/// Byte range of one comment in a source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSpan {
    pub start: usize,
    pub end: usize,
}

/// Locate every comment matched by `pattern`.
pub fn find_comments(source: &str, pattern: &Regex) -> Vec<CommentSpan> {
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let m = match pattern.find_at(source, pos) {
            Some(m) => m,
            None => break,
        };
        if m.start() == m.end() {
            pos = next_char_boundary(source, m.end());
            continue;
        }
        let line_start = source[..m.start()].rfind('\n').map(|i| i + 1).unwrap_or(0);
        if inside_string(&source[line_start..m.start()]) {
            pos = next_char_boundary(source, m.start());
            continue;
        }
        spans.push(CommentSpan {
            start: m.start(),
            end: m.end(),
        });
        pos = m.end();
    }

    spans
}

fn next_char_boundary(source: &str, offset: usize) -> usize {
    let mut next = offset + 1;
    while next < source.len() && !source.is_char_boundary(next) {
        next += 1;
    }
    next
}

/// Whether a line prefix ends inside an unterminated string literal.
fn inside_string(prefix: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in prefix.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (None, '"' | '\'' | '`') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    quote.is_some()
}

/// Copy of `source` with every span blanked, preserving byte offsets and newlines.
pub fn mask(source: &str, spans: &[CommentSpan]) -> String {
    let mut bytes = source.as_bytes().to_vec();
    for span in spans {
        for b in &mut bytes[span.start..span.end] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    }
    // Only whole UTF-8 sequences inside spans are replaced, so the result stays valid.
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Comment syntax category from its raw text.
pub fn classify(raw: &str) -> CommentKind {
    let trimmed = raw.trim_start();
    if trimmed.starts_with("/**")
        || trimmed.starts_with("///")
        || trimmed.starts_with("//!")
        || trimmed.starts_with("/*!")
        || trimmed.starts_with("\"\"\"")
        || trimmed.starts_with("'''")
    {
        CommentKind::Doc
    } else if trimmed.starts_with("/*") || trimmed.starts_with("=begin") {
        CommentKind::Block
    } else {
        CommentKind::Line
    }
}

/// Comment text with delimiters and leading `*` gutters removed.
pub fn strip_delimiters(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("/**")
        .or_else(|| trimmed.strip_prefix("/*!"))
        .or_else(|| trimmed.strip_prefix("/*"))
        .map(|s| s.strip_suffix("*/").unwrap_or(s))
        .or_else(|| {
            trimmed
                .strip_prefix("\"\"\"")
                .map(|s| s.strip_suffix("\"\"\"").unwrap_or(s))
        })
        .or_else(|| {
            trimmed
                .strip_prefix("'''")
                .map(|s| s.strip_suffix("'''").unwrap_or(s))
        })
        .or_else(|| {
            trimmed
                .strip_prefix("=begin")
                .map(|s| s.strip_suffix("=end").unwrap_or(s))
        })
        .unwrap_or(trimmed);

    inner
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line
                .strip_prefix("///")
                .or_else(|| line.strip_prefix("//!"))
                .or_else(|| line.strip_prefix("//"))
                .or_else(|| line.strip_prefix('#'))
                .or_else(|| line.strip_prefix('*'))
                .unwrap_or(line);
            line.trim()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build a comment record from raw comment text starting at `offset`.
pub fn comment_at(raw: &str, offset: usize, lines: &LineIndex) -> CommentInfo {
    CommentInfo {
        text: strip_delimiters(raw),
        line: lines.line(offset),
        kind: classify(raw),
    }
}

/// Comments of a source file found by pattern.
pub fn collect(source: &str, pattern: &Regex) -> Vec<CommentInfo> {
    let lines = LineIndex::new(source);
    find_comments(source, pattern)
        .into_iter()
        .map(|span| comment_at(&source[span.start..span.end], span.start, &lines))
        .collect()
}

/// Mine TODO markers and annotations from comments.
///
/// Lines are counted from each comment's first line; delimiter-only lines
/// are dropped by `strip_delimiters`, so marker lines inside block comments
/// are located by re-scanning the original text.
pub fn mine(comments: &[CommentInfo], source: &str) -> (Vec<TodoInfo>, Vec<Annotation>) {
    let source_lines: Vec<&str> = source.lines().collect();
    let mut todos = Vec::new();
    let mut annotations = Vec::new();

    for comment in comments {
        let mut search_from = comment.line.saturating_sub(1);
        for text_line in comment.text.lines() {
            let line = locate_line(&source_lines, search_from, text_line).unwrap_or(comment.line);
            search_from = line.saturating_sub(1);

            if let Some(caps) = TODO_PATTERN.captures(text_line) {
                todos.push(TodoInfo {
                    marker: caps[1].to_string(),
                    text: caps.get(2).map(|m| m.as_str().trim()).unwrap_or("").to_string(),
                    line,
                });
            }

            if let Some(caps) = ANNOTATION_PATTERN.captures(text_line) {
                let values = caps["value"]
                    .trim_end_matches("*/")
                    .split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect();
                annotations.push(Annotation {
                    key: caps["key"].to_string(),
                    values,
                    line,
                });
            }
        }
    }

    (todos, annotations)
}

/// 1-indexed line at or after `from` (0-indexed) containing `needle`.
fn locate_line(lines: &[&str], from: usize, needle: &str) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, line)| line.contains(needle))
        .map(|(i, _)| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_comments() -> Regex {
        Regex::new(r"//[^\n]*|(?s:/\*.*?\*/)").unwrap()
    }

    #[test]
    fn test_find_comments_skips_strings() {
        let source = "const url = \"http://example.com\"; // real comment\n/* block */\n";
        let spans = find_comments(source, &c_comments());
        assert_eq!(spans.len(), 2);
        assert_eq!(&source[spans[0].start..spans[0].end], "// real comment");
        assert_eq!(&source[spans[1].start..spans[1].end], "/* block */");
    }

    #[test]
    fn test_mask_preserves_offsets() {
        let source = "a // x\nb /* y\nz */ c\n";
        let spans = find_comments(source, &c_comments());
        let masked = mask(source, &spans);
        assert_eq!(masked.len(), source.len());
        assert_eq!(masked.lines().count(), source.lines().count());
        assert!(!masked.contains('x'));
        assert!(masked.contains('c'));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("/** docs */"), CommentKind::Doc);
        assert_eq!(classify("/// docs"), CommentKind::Doc);
        assert_eq!(classify("/* block */"), CommentKind::Block);
        assert_eq!(classify("# line"), CommentKind::Line);
    }

    #[test]
    fn test_mine_todos_and_annotations() {
        let source = "// TODO(alice): handle retries\n/**\n * @semantic-tags: user-domain, public-api\n * FIXME broken on empty input\n */\nfn x() {}\n";
        let comments = collect(source, &c_comments());
        let (todos, annotations) = mine(&comments, source);

        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].marker, "TODO");
        assert_eq!(todos[0].text, "handle retries");
        assert_eq!(todos[0].line, 1);
        assert_eq!(todos[1].marker, "FIXME");
        assert_eq!(todos[1].line, 4);

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].key, "semantic-tags");
        assert_eq!(annotations[0].values, vec!["user-domain", "public-api"]);
        assert_eq!(annotations[0].line, 3);
    }

    #[test]
    fn test_lowercase_words_are_not_markers() {
        let source = "# note that this is fine\n";
        let comments = collect(source, &Regex::new(r"#[^\n]*").unwrap());
        let (todos, _) = mine(&comments, source);
        assert!(todos.is_empty());
    }
}
