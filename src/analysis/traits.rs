//! Core traits for language analysis.

use crate::parser::SyntaxTree;

use super::{
    collect_comments, identifiers_in, ClassInfo, CommentInfo, ExportMethodInfo, FunctionInfo,
    IdentifierInfo, RawDependency,
};

/// Language-specific analyzer walking grammar-backed syntax trees.
///
/// Each grammar language (TypeScript, Python, Go, ...) implements this trait
/// to turn nodes into facts. Every method expects a tree with a concrete
/// grammar tree; pattern-only trees are handled by `patterns::fallback`.
///
/// # Thread Safety
///
/// Analyzers are shared singletons. Anything compiled lazily (such as
/// tree-sitter queries) must be stored in thread-safe cells.
pub trait LanguageAnalyzer: Send + Sync {
    /// Returns the language identifier (e.g., "go", "rust").
    fn language_id(&self) -> &'static str;

    /// Dependencies in source order, one per recognized node.
    fn dependencies(&self, tree: &SyntaxTree) -> Vec<RawDependency>;

    /// Exports produced by the language's processor chain, before
    /// supplementation and deduplication.
    fn exports(&self, tree: &SyntaxTree) -> Vec<ExportMethodInfo>;

    /// Every function and method, with cyclomatic complexity.
    fn functions(&self, tree: &SyntaxTree) -> anyhow::Result<Vec<FunctionInfo>>;

    /// Class-like declarations with members and heritage.
    fn classes(&self, tree: &SyntaxTree) -> Vec<ClassInfo>;

    /// Node kinds counted as identifier occurrences.
    fn identifier_kinds(&self) -> &'static [&'static str];

    /// Distinct identifiers with usage counts, in first-appearance order.
    fn identifiers(&self, tree: &SyntaxTree) -> Vec<IdentifierInfo> {
        identifiers_in(tree, self.identifier_kinds())
    }

    /// Node kinds holding comments.
    fn comment_kinds(&self) -> &'static [&'static str] {
        &["comment"]
    }

    /// Comments in source order.
    fn comments(&self, tree: &SyntaxTree) -> Vec<CommentInfo> {
        collect_comments(tree, self.comment_kinds())
    }
}
