//! Pattern-only fact extraction.
//!
//! Used for languages without a grammar and for grammar languages whose
//! parse failed. Produces the same fact shapes as the grammar walkers, with
//! lower precision: function complexity is always 1 and class members are
//! limited to methods whose header falls inside the class body.

use std::collections::HashSet;
use std::path::Path;

use lazy_static::lazy_static;
use phf::phf_set;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::comments::{self, CommentSpan};
use super::{BlockStyle, LanguageConfig, SourceSplit};
use crate::analysis::exports;
use crate::analysis::{
    tally_identifiers, ClassInfo, ClassKind, CommentFacts, DependencyInfo, ExportFacts,
    ExportMethodInfo, FunctionInfo, IdentifierInfo,
};
use crate::parser::{LineIndex, Location};

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").unwrap();
    static ref STRING_LITERAL: Regex =
        Regex::new(r#""(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'|`(?:[^`\\]|\\.)*`"#).unwrap();
    static ref QUOTED: Regex = Regex::new(r#""([^"]+)""#).unwrap();
}

/// Words never reported as identifiers by the pattern path.
static KEYWORDS: phf::Set<&'static str> = phf_set! {
    "abstract", "and", "as", "async", "await", "begin", "bool", "boolean", "break", "byte",
    "case", "catch", "char", "class", "const", "continue", "def", "default", "defer", "del",
    "delete", "do", "double", "elif", "else", "elsif", "end", "ensure", "enum", "except",
    "export", "extends", "extern", "false", "final", "finally", "float", "fn", "for",
    "foreach", "from", "fun", "func", "function", "go", "goto", "if", "impl", "implements",
    "import", "in", "include", "instanceof", "int", "interface", "is", "lambda", "let",
    "long", "loop", "match", "mod", "module", "namespace", "new", "nil", "none", "None",
    "not", "null", "object", "or", "override", "package", "pass", "private", "protected",
    "pub", "public", "raise", "require", "require_relative", "rescue", "return", "self",
    "short", "sizeof", "static", "string", "struct", "super", "switch", "this", "throw",
    "throws", "trait", "true", "True", "False", "try", "type", "typedef", "typeof", "union",
    "unless", "unsigned", "until", "use", "using", "val", "var", "void", "when", "where",
    "while", "with", "yield",
};

/// Every fact kind extracted from one source by pattern matching, in the
/// same shapes the built-in extractors emit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternFacts {
    pub dependencies: Vec<DependencyInfo>,
    pub exports: ExportFacts,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub identifiers: Vec<IdentifierInfo>,
    pub comments: CommentFacts,
}

/// Source prepared for scanning: comments blanked, line index built.
pub struct Scan<'a> {
    pub config: &'a LanguageConfig,
    pub source: &'a str,
    pub masked: String,
    pub lines: LineIndex,
    pub comment_spans: Vec<CommentSpan>,
}

impl<'a> Scan<'a> {
    pub fn new(config: &'a LanguageConfig, source: &'a str) -> Self {
        let comment_spans = comments::find_comments(source, &config.comment_pattern);
        let masked = comments::mask(source, &comment_spans);
        Self {
            config,
            source,
            masked,
            lines: LineIndex::new(source),
            comment_spans,
        }
    }

    fn location(&self, start: usize, end: usize) -> Location {
        let (line, column) = self.lines.position(start);
        let (end_line, end_column) = self.lines.position(end);
        Location {
            line,
            column,
            end_line,
            end_column,
        }
    }
}

/// Extract every fact kind at once from a single scan.
///
/// Convenience for callers that want all pattern facts without an engine;
/// the extractors call the per-kind functions below on their own scans.
pub fn extract_facts(config: &LanguageConfig, source: &str, file_path: &Path) -> PatternFacts {
    let scan = Scan::new(config, source);
    let exports = exports_of(&scan);
    let exported: HashSet<String> = exports.exports.iter().map(|e| e.name.clone()).collect();
    let classes = classes_of(&scan, &exported);
    PatternFacts {
        dependencies: dependencies_of(&scan, file_path),
        functions: functions_of(&scan, &exported, &classes),
        classes: classes.into_iter().map(|(class, _)| class).collect(),
        exports,
        identifiers: identifiers_of(&scan),
        comments: comments_of(&scan),
    }
}

/// Dependencies in source order.
pub fn dependencies_of(scan: &Scan, file_path: &Path) -> Vec<DependencyInfo> {
    let mut found: Vec<(usize, DependencyInfo)> = Vec::new();

    for pattern in &scan.config.dependency_patterns {
        for caps in pattern.scanner.captures_iter(&scan.masked) {
            let Some(m) = caps.name("source") else {
                continue;
            };
            for (source, offset) in split_sources(m.as_str(), m.start(), pattern.split) {
                let is_local = (pattern.is_local)(&source);
                let resolved_path = if is_local {
                    scan.config.resolve(file_path, &source, pattern.kind)
                } else {
                    None
                };
                found.push((
                    offset,
                    DependencyInfo {
                        source,
                        kind: pattern.kind,
                        is_local,
                        line: scan.lines.line(offset),
                        resolved_path,
                    },
                ));
            }
        }
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, dep)| dep).collect()
}

fn split_sources(text: &str, offset: usize, split: SourceSplit) -> Vec<(String, usize)> {
    match split {
        SourceSplit::Single => vec![(text.trim().to_string(), offset)],
        SourceSplit::Commas => {
            let mut pieces = Vec::new();
            let mut start = 0;
            for part in text.split(',') {
                let lead = part.len() - part.trim_start().len();
                if let Some(module) = part.split_whitespace().next() {
                    pieces.push((module.to_string(), offset + start + lead));
                }
                start += part.len() + 1;
            }
            pieces
        }
        SourceSplit::QuotedStrings => QUOTED
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| (m.as_str().to_string(), offset + m.start()))
            .collect(),
    }
}

/// Export facts: table patterns, re-export supplementation, dedup and class aggregation.
pub fn exports_of(scan: &Scan) -> ExportFacts {
    let mut found: Vec<(usize, ExportMethodInfo)> = Vec::new();

    for pattern in &scan.config.export_patterns {
        for caps in pattern.scanner.captures_iter(&scan.masked) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
                continue;
            };
            if !(pattern.accept)(name.as_str(), whole.as_str()) {
                continue;
            }
            let declaration = scan.masked[whole.start()..name.start()]
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            let mut export = ExportMethodInfo::new(
                name.as_str(),
                pattern.export_type,
                declaration,
                scan.location(name.start(), name.end()),
            );
            export.is_default = pattern.is_default;
            found.push((name.start(), export));
        }
    }

    found.sort_by_key(|(offset, _)| *offset);
    let mut list: Vec<ExportMethodInfo> = found.into_iter().map(|(_, e)| e).collect();
    if scan.config.reexports {
        exports::supplement_reexports(&scan.masked, &scan.lines, None, &mut list);
    }
    exports::finalize(list)
}

/// Class-like declarations with the byte range of their bodies.
pub fn classes_of(scan: &Scan, exported: &HashSet<String>) -> Vec<(ClassInfo, (usize, usize))> {
    let Some(pattern) = &scan.config.class_pattern else {
        return Vec::new();
    };

    pattern
        .captures_iter(&scan.masked)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.name("name")?;
            let keyword = caps
                .name("kind")
                .and_then(|k| k.as_str().split_whitespace().next())
                .unwrap_or("class");
            let body_end = block_end(scan, name.end(), indent_of(scan, &caps, whole.start()));

            let mut class = ClassInfo::new(
                name.as_str(),
                ClassKind::from_keyword(keyword),
                scan.location(whole.start(), body_end),
            );
            class.heritage = caps
                .name("heritage")
                .map(|h| parse_heritage(h.as_str()))
                .unwrap_or_default();
            class.is_exported = exported.contains(name.as_str());
            Some((class, (whole.end(), body_end)))
        })
        .collect()
}

/// Functions, attributing those inside a class body to the class as methods.
pub fn functions_of(
    scan: &Scan,
    exported: &HashSet<String>,
    classes: &[(ClassInfo, (usize, usize))],
) -> Vec<FunctionInfo> {
    let mut found: Vec<(usize, FunctionInfo)> = Vec::new();
    let mut seen: HashSet<usize> = HashSet::new();

    for pattern in &scan.config.function_patterns {
        for caps in pattern.captures_iter(&scan.masked) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
                continue;
            };
            if is_control_word(name.as_str()) || !seen.insert(name.start()) {
                continue;
            }

            let header_end = caps.name("params").map(|p| p.end()).unwrap_or(name.end());
            let end = block_end(scan, header_end, indent_of(scan, &caps, whole.start()));
            let location = scan.location(whole.start(), end);
            let receiver = caps.name("receiver").and_then(|r| receiver_type(r.as_str()));
            let enclosing = classes
                .iter()
                .filter(|(_, (start, stop))| name.start() > *start && name.start() < *stop)
                .min_by_key(|(_, (start, stop))| stop - start)
                .map(|(class, _)| class.name.clone());
            let parent = receiver.or(enclosing);

            found.push((
                whole.start(),
                FunctionInfo {
                    name: name.as_str().to_string(),
                    kind: if parent.is_some() { "method" } else { "function" }.to_string(),
                    parent,
                    line_count: location.end_line - location.line + 1,
                    location,
                    parameters: caps
                        .name("params")
                        .map(|p| split_parameters(p.as_str()))
                        .unwrap_or_default(),
                    is_async: caps.name("async").is_some(),
                    is_exported: exported.contains(name.as_str()),
                    complexity: 1,
                },
            ));
        }
    }

    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, f)| f).collect()
}

/// Distinct identifiers outside comments and string literals.
pub fn identifiers_of(scan: &Scan) -> Vec<IdentifierInfo> {
    let without_strings = STRING_LITERAL.replace_all(&scan.masked, |caps: &Captures| {
        caps[0]
            .chars()
            .map(|c| if c == '\n' { '\n' } else { ' ' })
            .collect::<String>()
    });
    let lines = LineIndex::new(&without_strings);

    tally_identifiers(
        WORD.find_iter(&without_strings)
            .filter(|m| !KEYWORDS.contains(m.as_str()))
            .map(|m| (m.as_str().to_string(), lines.line(m.start()))),
    )
}

/// Comments with mined markers and annotations.
pub fn comments_of(scan: &Scan) -> CommentFacts {
    let comments: Vec<_> = scan
        .comment_spans
        .iter()
        .map(|span| comments::comment_at(&scan.source[span.start..span.end], span.start, &scan.lines))
        .collect();
    let (todos, annotations) = comments::mine(&comments, scan.source);
    CommentFacts {
        comments,
        todos,
        annotations,
    }
}

fn indent_of(scan: &Scan, caps: &Captures, match_start: usize) -> usize {
    if let Some(indent) = caps.name("indent") {
        return indent.as_str().len();
    }
    let line_start = scan.masked[..match_start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &scan.masked[line_start..];
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Estimated end offset of the block opened by a declaration header.
fn block_end(scan: &Scan, header_end: usize, indent: usize) -> usize {
    match scan.config.block_style {
        BlockStyle::Braces => brace_block_end(&scan.masked, header_end),
        BlockStyle::Indent => indent_block_end(&scan.masked, header_end, indent),
    }
}

fn brace_block_end(source: &str, from: usize) -> usize {
    let bytes = source.as_bytes();
    let mut i = from;
    // A `;` or a blank line before any `{` means a declaration without a body.
    while i < bytes.len() {
        match bytes[i] {
            b'{' => break,
            b';' => return i + 1,
            b'\n' if blank_line_at(bytes, i + 1) => return i,
            _ => i += 1,
        }
    }

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q || b == b'\n' {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    source.len()
}

fn blank_line_at(bytes: &[u8], start: usize) -> bool {
    let rest = &bytes[start.min(bytes.len())..];
    let pad = rest
        .iter()
        .take_while(|b| matches!(**b, b' ' | b'\t' | b'\r'))
        .count();
    rest.get(pad).map_or(true, |b| *b == b'\n')
}

fn indent_block_end(source: &str, header_end: usize, indent: usize) -> usize {
    let rest_start = source[header_end..]
        .find('\n')
        .map(|i| header_end + i + 1)
        .unwrap_or(source.len());
    let mut end = rest_start.saturating_sub(1).max(header_end);
    let mut offset = rest_start;

    for line in source[rest_start..].split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let trimmed = content.trim_start_matches([' ', '\t']);
        if trimmed.is_empty() {
            offset += line.len();
            continue;
        }
        let line_indent = content.len() - trimmed.len();
        if line_indent <= indent {
            let closes = trimmed == "end" || trimmed.starts_with("end ") || trimmed.starts_with("end.");
            if line_indent == indent && closes {
                end = offset + content.len();
            }
            break;
        }
        end = offset + content.len();
        offset += line.len();
    }
    end
}

fn is_control_word(name: &str) -> bool {
    matches!(
        name,
        "if" | "else" | "for" | "while" | "switch" | "return" | "catch" | "do" | "case" | "when"
            | "sizeof" | "new" | "throw"
    )
}

/// Type name of a Go-style receiver (`s *UserService` -> `UserService`).
fn receiver_type(receiver: &str) -> Option<String> {
    receiver
        .split_whitespace()
        .last()
        .map(|t| t.trim_start_matches(['*', '&']))
        .map(|t| t.split('[').next().unwrap_or(t).to_string())
        .filter(|t| !t.is_empty())
}

fn split_parameters(params: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in params.chars() {
        match c {
            '<' | '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            '>' | ')' | ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                out.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    out.push(current.trim().to_string());
    out.retain(|p| !p.is_empty());
    out.into_iter()
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect()
}

/// Names listed in a heritage clause (`extends A implements B, C`, `(Base)`, `: public X`).
fn parse_heritage(text: &str) -> Vec<String> {
    let normalized = strip_type_arguments(text).replace(['(', ')', ':', '{'], ",");
    let mut names: Vec<String> = Vec::new();
    for part in normalized.split(',') {
        for name in part.split_whitespace() {
            if matches!(
                name,
                "extends" | "implements" | "with" | "public" | "private" | "protected" | "virtual"
                    | "where" | "final" | "sealed"
            ) {
                continue;
            }
            if !name.is_empty()
                && !name.contains('=')
                && name.chars().next().map_or(false, |c| c.is_alphabetic() || c == '_')
                && !names.iter().any(|n| n == name)
            {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Drop `<...>` and `[...]` groups, nested ones included.
fn strip_type_arguments(text: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' | '[' => depth += 1,
            '>' | ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::analysis::{DependencyKind, ExportType};
    use crate::patterns::config_for;

    fn names<T, F: Fn(&T) -> &str>(items: &[T], f: F) -> HashMap<String, usize> {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| (f(item).to_string(), i))
            .collect()
    }

    const RUBY_SOURCE: &str = r#"# frozen_string_literal: true
require 'json'
require_relative 'helpers/format'
require './lib/local_loader'

# TODO: cache parsed payloads
module Billing
  class Invoice < Base
    def initialize(amount)
      @amount = amount
    end

    def total(tax, discount)
      @amount + tax - discount
    end
  end
end

def standalone
  puts "require 'not_a_dependency'"
end
"#;

    #[test]
    fn test_ruby_dependencies() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("helpers")).unwrap();
        fs::write(dir.path().join("helpers/format.rb"), "").unwrap();
        let file = dir.path().join("invoice.rb");

        let facts = extract_facts(config_for("ruby").unwrap(), RUBY_SOURCE, &file);
        assert_eq!(facts.dependencies.len(), 3);

        let json = &facts.dependencies[0];
        assert_eq!(json.source, "json");
        assert_eq!(json.kind, DependencyKind::Require);
        assert!(!json.is_local);
        assert_eq!(json.line, 2);

        let helper = &facts.dependencies[1];
        assert_eq!(helper.source, "helpers/format");
        assert!(helper.is_local);
        assert_eq!(
            Path::new(helper.resolved_path.as_deref().unwrap()),
            dir.path().join("helpers/format.rb")
        );

        let loader = &facts.dependencies[2];
        assert!(loader.is_local);
        assert!(loader.resolved_path.is_none());
    }

    #[test]
    fn test_ruby_structure() {
        let facts = extract_facts(config_for("ruby").unwrap(), RUBY_SOURCE, Path::new("x.rb"));

        let classes = names(&facts.classes, |c| c.name.as_str());
        assert!(classes.contains_key("Billing"));
        let invoice = &facts.classes[classes["Invoice"]];
        assert_eq!(invoice.heritage, vec!["Base"]);

        let total = facts.functions.iter().find(|f| f.name == "total").unwrap();
        assert_eq!(total.kind, "method");
        assert_eq!(total.parent.as_deref(), Some("Invoice"));
        assert_eq!(total.parameters, vec!["tax", "discount"]);
        assert_eq!(total.line_count, 3);

        let standalone = facts.functions.iter().find(|f| f.name == "standalone").unwrap();
        assert_eq!(standalone.kind, "function");
        assert!(standalone.is_exported);

        assert!(facts
            .exports
            .exports
            .iter()
            .any(|e| e.name == "Billing" && e.export_type == ExportType::Class));
        assert_eq!(facts.comments.todos.len(), 1);
        assert_eq!(facts.comments.todos[0].line, 6);
    }

    #[test]
    fn test_identifiers_skip_strings_and_keywords() {
        let facts = extract_facts(config_for("ruby").unwrap(), RUBY_SOURCE, Path::new("x.rb"));
        let ids = names(&facts.identifiers, |i| i.name.as_str());
        assert!(ids.contains_key("amount"));
        assert!(!ids.contains_key("not_a_dependency"));
        assert!(!ids.contains_key("def"));
        let amount = &facts.identifiers[ids["amount"]];
        assert!(amount.count >= 3);
    }

    #[test]
    fn test_go_import_block() {
        let source = "package main\n\nimport (\n\t\"fmt\"\n\tlog \"github.com/sirupsen/logrus\"\n)\n";
        let facts = extract_facts(config_for("go").unwrap(), source, Path::new("main.go"));
        let sources: Vec<_> = facts.dependencies.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(sources, vec!["fmt", "github.com/sirupsen/logrus"]);
        assert_eq!(facts.dependencies[1].line, 5);
    }

    #[test]
    fn test_python_comma_imports() {
        let source = "import os, sys as system\nfrom .models import User\n";
        let facts = extract_facts(config_for("python").unwrap(), source, Path::new("app.py"));
        let sources: Vec<_> = facts.dependencies.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(sources, vec!["os", "sys", ".models"]);
        assert!(facts.dependencies[2].is_local);
    }

    #[test]
    fn test_commented_dependencies_ignored() {
        let source = "#include \"local.h\"\n// #include \"ghost.h\"\n#include <stdio.h>\n";
        let facts = extract_facts(config_for("c").unwrap(), source, Path::new("main.c"));
        assert_eq!(facts.dependencies.len(), 2);
        assert!(facts.dependencies[0].is_local);
        assert!(!facts.dependencies[1].is_local);
    }

    #[test]
    fn test_c_functions_and_exports() {
        let source = "static int helper(int x) {\n    return x;\n}\n\nint add(int a, int b) {\n    if (a) {\n        return helper(a) + b;\n    }\n    return b;\n}\n";
        let facts = extract_facts(config_for("c").unwrap(), source, Path::new("math.c"));
        let exported: Vec<_> = facts.exports.exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(exported, vec!["add"]);
        let add = facts.functions.iter().find(|f| f.name == "add").unwrap();
        assert_eq!(add.line_count, 6);
        assert_eq!(add.parameters, vec!["int a", "int b"]);
        assert!(!facts.functions.iter().any(|f| f.name == "if"));
    }

    #[test]
    fn test_heritage_parsing() {
        assert_eq!(parse_heritage(" extends Base implements A, B<T> "), vec!["Base", "A", "B"]);
        assert_eq!(parse_heritage(" : public Widget, private Noncopyable "), vec!["Widget", "Noncopyable"]);
        assert_eq!(parse_heritage("Base, metaclass=Meta"), vec!["Base"]);
    }

    #[test]
    fn test_heritage_skips_generic_arguments() {
        assert_eq!(
            parse_heritage(" : Repository<Map<String, List<Int>>>(), Runnable "),
            vec!["Repository", "Runnable"]
        );
        assert_eq!(parse_heritage(" extends Service[Request, Response] with Logging "), vec!["Service", "Logging"]);
        assert_eq!(parse_heritage(" : IComparer<T>, IDisposable "), vec!["IComparer", "IDisposable"]);
    }

    #[test]
    fn test_receiver_type() {
        assert_eq!(receiver_type("s *UserService").as_deref(), Some("UserService"));
        assert_eq!(receiver_type("l List[T]").as_deref(), Some("List"));
    }
}
