//! TypeScript language analyzer using tree-sitter.
//!
//! `.ts` and `.tsx` files share this analyzer; the complexity query is
//! compiled once per grammar and picked by the tree being analyzed.

use crate::analysis::{
    measure_functions, ClassInfo, ExportMethodInfo, FunctionInfo, LanguageAnalyzer, LazyQuery,
    RawDependency,
};
use crate::parser::languages::typescript::COMPLEXITY_QUERY;
use crate::parser::SyntaxTree;

use super::ecmascript;

/// TypeScript language analyzer.
pub struct TypeScriptAnalyzer {
    typescript: LazyQuery,
    tsx: LazyQuery,
}

impl TypeScriptAnalyzer {
    /// Create a new TypeScript analyzer.
    pub fn new() -> Self {
        Self {
            typescript: LazyQuery::new(
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                COMPLEXITY_QUERY,
            ),
            tsx: LazyQuery::new(tree_sitter_typescript::LANGUAGE_TSX.into(), COMPLEXITY_QUERY),
        }
    }

    fn query_for(&self, tree: &SyntaxTree) -> &LazyQuery {
        match tree.root() {
            Some(root) if self.tsx.applies_to(root) => &self.tsx,
            _ => &self.typescript,
        }
    }
}

impl Default for TypeScriptAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for TypeScriptAnalyzer {
    fn language_id(&self) -> &'static str {
        "typescript"
    }

    fn dependencies(&self, tree: &SyntaxTree) -> Vec<RawDependency> {
        ecmascript::dependencies(tree)
    }

    fn exports(&self, tree: &SyntaxTree) -> Vec<ExportMethodInfo> {
        ecmascript::exports(tree)
    }

    fn functions(&self, tree: &SyntaxTree) -> anyhow::Result<Vec<FunctionInfo>> {
        let exports = self.exports(tree);
        measure_functions(
            tree,
            ecmascript::function_sites(tree),
            self.query_for(tree),
            &exports,
        )
    }

    fn classes(&self, tree: &SyntaxTree) -> Vec<ClassInfo> {
        ecmascript::classes(tree, &self.exports(tree))
    }

    fn identifier_kinds(&self) -> &'static [&'static str] {
        ecmascript::identifier_kinds()
    }
}
