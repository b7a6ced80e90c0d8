//! JavaScript provider.

use crate::parser::treesitter::{GrammarConfig, TreeSitterProvider};
use crate::parser::DetectionRules;

/// Tree-sitter query for counting cyclomatic complexity in JavaScript.
pub const COMPLEXITY_QUERY: &str = r#"
(if_statement) @branch
(for_statement) @branch
(for_in_statement) @branch
(while_statement) @branch
(do_statement) @branch
(switch_statement) @branch
(switch_case) @branch
(catch_clause) @branch
(ternary_expression) @branch
(binary_expression operator: "&&") @branch
(binary_expression operator: "||") @branch
(binary_expression operator: "??") @branch
"#;

pub const RULES: DetectionRules =
    DetectionRules::extensions(&["js", "jsx", "mjs", "cjs"]).with_interpreters(&["node"]);

/// Create the JavaScript provider.
pub fn provider() -> TreeSitterProvider {
    TreeSitterProvider::new(GrammarConfig {
        name: "javascript",
        language_id: "javascript",
        grammar: tree_sitter_javascript::LANGUAGE.into(),
        rules: RULES,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::parser::SyntaxProvider;

    #[test]
    fn test_javascript_parse_commonjs() {
        let source = r#"
const path = require('path');

function join(a, b) {
    return path.join(a, b);
}

module.exports = { join };
"#;
        let result = provider().parse(source, Path::new("join.js"));
        assert!(result.errors().is_empty());
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_javascript_claims_jsx() {
        let js = provider();
        assert!(js.claims(Path::new("view.jsx"), None));
        assert!(js.claims(Path::new("server.cjs"), None));
        assert!(!js.claims(Path::new("server.ts"), None));
    }
}
