//! Grammar-backed fact extraction.
//!
//! This module turns tree-sitter trees into language-neutral facts:
//! - Dependencies (imports, requires, includes, uses)
//! - Exports, run through a per-language processor chain
//! - Functions and methods with cyclomatic complexity
//! - Class-like declarations with members and heritage
//! - Identifier tallies and comments
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ SyntaxTree      │────▶│ Analyzers    │────▶│ Facts         │
//! │ (tree-sitter)   │     │ (Go, TS, ..) │     │ (Dependencies,│
//! └─────────────────┘     └──────────────┘     │  Exports, ...)│
//!         │                                    └───────────────┘
//!         │ pattern-only                               ▲
//!         ▼                                            │
//! ┌─────────────────┐                                  │
//! │ patterns::      │──────────────────────────────────┘
//! │ fallback        │
//! └─────────────────┘
//! ```
//!
//! # Adding a New Language
//!
//! 1. Add a provider in `src/parser/languages/` with its complexity query
//! 2. Create a module in `src/analysis/languages/` implementing `LanguageAnalyzer`
//! 3. Register the analyzer in `languages/mod.rs`
//! 4. Add a pattern table in `src/patterns/tables.rs` for locality and resolution
//!
//! See `languages/go.rs` for a reference implementation.

pub mod exports;
mod facts;
mod languages;
mod traits;

use std::collections::{HashMap, HashSet};

use once_cell::sync::OnceCell;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Query, QueryCursor};

use crate::parser::SyntaxTree;
use crate::patterns::comments;

pub use exports::{ExportContext, ExportProcessor};
pub use facts::{
    Annotation, ClassExportInfo, ClassInfo, ClassKind, CommentFacts, CommentInfo, CommentKind,
    DependencyInfo, DependencyKind, ExportFacts, ExportMethodInfo, ExportType, FunctionInfo,
    IdentifierInfo, RawDependency, TodoInfo,
};
pub use languages::{
    get_analyzer, register_analyzers, registered_languages, GoAnalyzer, JavaAnalyzer,
    JavaScriptAnalyzer, PythonAnalyzer, RustAnalyzer, TypeScriptAnalyzer,
};
pub use traits::LanguageAnalyzer;

/// Tally identifier occurrences, keeping first-appearance order.
///
/// Each item is an identifier name and the 1-indexed line it appeared on.
pub fn tally_identifiers(occurrences: impl Iterator<Item = (String, usize)>) -> Vec<IdentifierInfo> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut tally: Vec<IdentifierInfo> = Vec::new();

    for (name, line) in occurrences {
        match index.get(&name) {
            Some(&i) => tally[i].count += 1,
            None => {
                index.insert(name.clone(), tally.len());
                tally.push(IdentifierInfo {
                    name,
                    count: 1,
                    first_line: line,
                });
            }
        }
    }

    tally
}

/// Identifier tally over every node of the given kinds.
pub(crate) fn identifiers_in(tree: &SyntaxTree, kinds: &[&str]) -> Vec<IdentifierInfo> {
    let Some(root) = tree.root() else {
        return Vec::new();
    };
    let mut occurrences = Vec::new();
    walk(root, |node| {
        if kinds.contains(&node.kind()) {
            occurrences.push((tree.text(node).to_string(), node.start_position().row + 1));
        }
        true
    });
    tally_identifiers(occurrences.into_iter())
}

/// Comments held by nodes of the given kinds, in source order.
pub(crate) fn collect_comments(tree: &SyntaxTree, kinds: &[&str]) -> Vec<CommentInfo> {
    let Some(root) = tree.root() else {
        return Vec::new();
    };
    let mut found = Vec::new();
    walk(root, |node| {
        if kinds.contains(&node.kind()) {
            found.push(comments::comment_at(tree.text(node), node.start_byte(), tree.lines()));
            return false;
        }
        true
    });
    found
}

/// Preorder walk below (and including) `root`. The visitor returns whether
/// to descend into the node's children.
pub(crate) fn walk<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>) -> bool) {
    let mut cursor = root.walk();
    loop {
        let descend = visit(cursor.node());
        if descend && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Closest ancestor of one of the given kinds.
pub(crate) fn ancestor<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut current = node.parent();
    while let Some(n) = current {
        if kinds.contains(&n.kind()) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Whether the node has a direct child of the given kind (named or anonymous).
pub(crate) fn has_child(node: Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == kind);
    found
}

/// Text of a field child.
pub(crate) fn field_text<'a>(tree: &'a SyntaxTree, node: Node, field: &str) -> Option<&'a str> {
    node.child_by_field_name(field).map(|n| tree.text(n))
}

/// String literal contents without surrounding quotes.
pub(crate) fn unquote(text: &str) -> String {
    text.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

/// Parameter names of a parameter list node.
pub(crate) fn parameter_names(tree: &SyntaxTree, params: Node) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = params.walk();

    for param in params.named_children(&mut cursor) {
        if param.kind().contains("comment") {
            continue;
        }
        let mut field_cursor = param.walk();
        let declared: Vec<_> = param.children_by_field_name("name", &mut field_cursor).collect();
        if !declared.is_empty() {
            names.extend(declared.into_iter().map(|n| tree.text(n).to_string()));
            continue;
        }
        let node = param
            .child_by_field_name("pattern")
            .or_else(|| param.child_by_field_name("left"))
            .or_else(|| match param.kind() {
                "typed_parameter" => param.named_child(0),
                _ => None,
            })
            .unwrap_or(param);
        names.push(tree.text(node).to_string());
    }

    names
}

/// Function record built from a declaration node.
pub(crate) struct FunctionSite<'t> {
    pub node: Node<'t>,
    pub name: String,
    pub parent: Option<String>,
    pub params: Option<Node<'t>>,
    pub is_async: bool,
}

impl<'t> FunctionSite<'t> {
    /// Site for a declaration node with `parameters` and an `async` marker.
    pub fn new(node: Node<'t>, name: impl Into<String>, parent: Option<String>) -> Self {
        Self {
            node,
            name: name.into(),
            parent,
            params: node.child_by_field_name("parameters"),
            is_async: has_child(node, "async"),
        }
    }

    pub fn into_info(self, tree: &SyntaxTree, complexity: u32, is_exported: bool) -> FunctionInfo {
        let location = tree.location_of(self.node);
        FunctionInfo {
            kind: if self.parent.is_some() { "method" } else { "function" }.to_string(),
            parameters: self
                .params
                .map(|p| parameter_names(tree, p))
                .unwrap_or_default(),
            line_count: location.end_line - location.line + 1,
            name: self.name,
            parent: self.parent,
            location,
            is_async: self.is_async,
            is_exported,
            complexity,
        }
    }
}

/// Measure function sites, marking those whose (qualified) name is exported.
pub(crate) fn measure_functions(
    tree: &SyntaxTree,
    sites: Vec<FunctionSite<'_>>,
    query: &LazyQuery,
    exports: &[ExportMethodInfo],
) -> anyhow::Result<Vec<FunctionInfo>> {
    let exported: HashSet<String> = exports
        .iter()
        .map(|e| match &e.parent_class {
            Some(parent) => format!("{}.{}", parent, e.name),
            None => e.name.clone(),
        })
        .collect();

    sites
        .into_iter()
        .map(|site| {
            let complexity = query.complexity(tree, site.node)?;
            let qualified = match &site.parent {
                Some(parent) => format!("{}.{}", parent, site.name),
                None => site.name.clone(),
            };
            Ok(site.into_info(tree, complexity, exported.contains(&qualified)))
        })
        .collect()
}

/// Tree-sitter query compiled on first use for one grammar.
pub(crate) struct LazyQuery {
    grammar: Language,
    source: &'static str,
    compiled: OnceCell<Query>,
}

impl LazyQuery {
    pub fn new(grammar: Language, source: &'static str) -> Self {
        Self {
            grammar,
            source,
            compiled: OnceCell::new(),
        }
    }

    /// Whether the node was produced by this query's grammar.
    pub fn applies_to(&self, node: Node) -> bool {
        *node.language() == self.grammar
    }

    pub fn get(&self) -> anyhow::Result<&Query> {
        let query = self
            .compiled
            .get_or_try_init(|| Query::new(&self.grammar, self.source))?;
        Ok(query)
    }

    /// Cyclomatic complexity of a node: 1 plus one per captured decision point.
    pub fn complexity(&self, tree: &SyntaxTree, node: Node) -> anyhow::Result<u32> {
        let query = self.get()?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, node, tree.source().as_bytes());

        let mut decisions = 0u32;
        while let Some(m) = matches.next() {
            decisions += m.captures.len() as u32;
        }

        Ok(1 + decisions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_keeps_first_appearance_order() {
        let tally = tally_identifiers(
            vec![
                ("b".to_string(), 1),
                ("a".to_string(), 2),
                ("b".to_string(), 3),
            ]
            .into_iter(),
        );
        assert_eq!(tally.len(), 2);
        assert_eq!(tally[0].name, "b");
        assert_eq!(tally[0].count, 2);
        assert_eq!(tally[0].first_line, 1);
        assert_eq!(tally[1].name, "a");
        assert_eq!(tally[1].first_line, 2);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"fmt\""), "fmt");
        assert_eq!(unquote("'./x'"), "./x");
        assert_eq!(unquote("`tpl`"), "tpl");
    }
}
