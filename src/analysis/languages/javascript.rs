//! JavaScript language analyzer using tree-sitter.
//!
//! Shares its walkers with the TypeScript analyzer; CommonJS exports
//! (`module.exports`, `exports.x`) matter most here.

use crate::analysis::{
    measure_functions, ClassInfo, ExportMethodInfo, FunctionInfo, LanguageAnalyzer, LazyQuery,
    RawDependency,
};
use crate::parser::languages::javascript::COMPLEXITY_QUERY;
use crate::parser::SyntaxTree;

use super::ecmascript;

/// JavaScript language analyzer.
pub struct JavaScriptAnalyzer {
    complexity: LazyQuery,
}

impl JavaScriptAnalyzer {
    /// Create a new JavaScript analyzer.
    pub fn new() -> Self {
        Self {
            complexity: LazyQuery::new(tree_sitter_javascript::LANGUAGE.into(), COMPLEXITY_QUERY),
        }
    }
}

impl Default for JavaScriptAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for JavaScriptAnalyzer {
    fn language_id(&self) -> &'static str {
        "javascript"
    }

    fn dependencies(&self, tree: &SyntaxTree) -> Vec<RawDependency> {
        ecmascript::dependencies(tree)
    }

    fn exports(&self, tree: &SyntaxTree) -> Vec<ExportMethodInfo> {
        ecmascript::exports(tree)
    }

    fn functions(&self, tree: &SyntaxTree) -> anyhow::Result<Vec<FunctionInfo>> {
        let exports = self.exports(tree);
        measure_functions(tree, ecmascript::function_sites(tree), &self.complexity, &exports)
    }

    fn classes(&self, tree: &SyntaxTree) -> Vec<ClassInfo> {
        ecmascript::classes(tree, &self.exports(tree))
    }

    fn identifier_kinds(&self) -> &'static [&'static str] {
        ecmascript::identifier_kinds()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::analysis::{DependencyKind, ExportType};
    use crate::parser::languages::javascript;
    use crate::parser::SyntaxProvider;

    fn parse(source: &str) -> SyntaxTree {
        javascript::provider()
            .parse(source, Path::new("test.js"))
            .ast()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_require_dependencies() {
        let tree = parse("const fs = require('fs');\nconst util = require(\"./util\");\n");
        let deps = JavaScriptAnalyzer::new().dependencies(&tree);
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().all(|d| d.kind == DependencyKind::Require));
        assert_eq!(deps[1].source, "./util");
        assert_eq!(deps[1].line, 2);
    }

    #[test]
    fn test_module_exports_object() {
        let tree = parse(
            r#"
function parse() {}
const VERSION = '1';
module.exports = { parse, VERSION, format: function () {}, build() {} };
"#,
        );
        let exports = JavaScriptAnalyzer::new().exports(&tree);
        let kinds: Vec<_> = exports.iter().map(|e| (e.name.as_str(), e.export_type)).collect();
        assert_eq!(
            kinds,
            vec![
                ("parse", ExportType::Function),
                ("VERSION", ExportType::Variable),
                ("format", ExportType::Function),
                ("build", ExportType::Function),
            ]
        );
    }

    #[test]
    fn test_module_exports_default_and_named() {
        let tree = parse("class Store {}\nmodule.exports = Store;\nexports.helper = () => 1;\n");
        let exports = JavaScriptAnalyzer::new().exports(&tree);
        assert_eq!(exports.len(), 2);
        assert_eq!(exports[0].name, "Store");
        assert_eq!(exports[0].export_type, ExportType::Class);
        assert!(exports[0].is_default);
        assert_eq!(exports[1].name, "helper");
        assert_eq!(exports[1].export_type, ExportType::Function);
    }

    #[test]
    fn test_private_fields() {
        let tree = parse("export class Counter {\n  #count = 0;\n  static zero = 0;\n  inc() { this.#count++; }\n}\n");
        let exports = JavaScriptAnalyzer::new().exports(&tree);
        let count = exports.iter().find(|e| e.name == "#count").unwrap();
        assert_eq!(count.visibility.as_deref(), Some("private"));
        let zero = exports.iter().find(|e| e.name == "zero").unwrap();
        assert_eq!(zero.is_static, Some(true));
    }

    #[test]
    fn test_functions_complexity() {
        let tree = parse("function f(x) {\n  switch (x) { case 1: return 1; case 2: return 2; }\n  return x ?? 0;\n}\n");
        let functions = JavaScriptAnalyzer::new().functions(&tree).unwrap();
        assert_eq!(functions.len(), 1);
        // switch + 2 cases + ??
        assert_eq!(functions[0].complexity, 5);
    }
}
