//! Syntax trees with back-references into their source text.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Source location with 1-indexed line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Byte offsets of every line start, for offset to line/column conversion.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    /// 1-indexed (line, column) for a byte offset.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.starts[line] + 1)
    }

    /// 1-indexed line for a byte offset.
    pub fn line(&self, offset: usize) -> usize {
        self.position(offset).0
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

/// A parsed source file.
///
/// Holds the immutable source buffer and, for grammar-backed languages, the
/// tree-sitter tree whose nodes are byte ranges into that buffer. Pattern-only
/// languages carry the source alone; extractors then use the language's
/// pattern table instead of walking nodes.
#[derive(Clone)]
pub struct SyntaxTree {
    source: Arc<str>,
    lines: Arc<LineIndex>,
    concrete: Option<tree_sitter::Tree>,
}

impl SyntaxTree {
    /// A tree produced by a grammar.
    pub fn concrete(tree: tree_sitter::Tree, source: Arc<str>) -> Self {
        let lines = Arc::new(LineIndex::new(&source));
        Self {
            source,
            lines,
            concrete: Some(tree),
        }
    }

    /// A source-only tree for languages handled by pattern matching.
    pub fn pattern_only(source: Arc<str>) -> Self {
        let lines = Arc::new(LineIndex::new(&source));
        Self {
            source,
            lines,
            concrete: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn shared_source(&self) -> Arc<str> {
        Arc::clone(&self.source)
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    pub fn is_pattern_only(&self) -> bool {
        self.concrete.is_none()
    }

    /// The tree-sitter tree, when the language has a grammar.
    pub fn tree(&self) -> Option<&tree_sitter::Tree> {
        self.concrete.as_ref()
    }

    pub fn root(&self) -> Option<tree_sitter::Node<'_>> {
        self.concrete.as_ref().map(|t| t.root_node())
    }

    /// Whether the grammar reported syntax errors anywhere in the tree.
    pub fn has_syntax_errors(&self) -> bool {
        self.root().map(|r| r.has_error()).unwrap_or(false)
    }

    /// Text of a node.
    pub fn text(&self, node: tree_sitter::Node) -> &str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    /// Location of a byte range, computed on demand.
    pub fn location(&self, start_byte: usize, end_byte: usize) -> Location {
        let (line, column) = self.lines.position(start_byte);
        let (end_line, end_column) = self.lines.position(end_byte);
        Location {
            line,
            column,
            end_line,
            end_column,
        }
    }

    pub fn location_of(&self, node: tree_sitter::Node) -> Location {
        self.location(node.start_byte(), node.end_byte())
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.lines.line(offset)
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("bytes", &self.source.len())
            .field("lines", &self.lines.line_count())
            .field("pattern_only", &self.is_pattern_only())
            .finish()
    }
}
