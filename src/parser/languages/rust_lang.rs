//! Rust provider.

use crate::parser::treesitter::{GrammarConfig, TreeSitterProvider};
use crate::parser::DetectionRules;

/// Tree-sitter query for counting cyclomatic complexity in Rust.
///
/// Counts:
/// - if/else expressions
/// - loops (for, while, loop)
/// - match expressions and arms
/// - logical operators (&&, ||)
pub const COMPLEXITY_QUERY: &str = r#"
(if_expression) @branch
(else_clause) @branch
(for_expression) @branch
(while_expression) @branch
(loop_expression) @branch
(match_expression) @branch
(match_arm) @branch
(binary_expression operator: "&&") @branch
(binary_expression operator: "||") @branch
"#;

pub const RULES: DetectionRules = DetectionRules::extensions(&["rs"]);

/// Create the Rust provider.
pub fn provider() -> TreeSitterProvider {
    TreeSitterProvider::new(GrammarConfig {
        name: "rust",
        language_id: "rust",
        grammar: tree_sitter_rust::LANGUAGE.into(),
        rules: RULES,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::parser::SyntaxProvider;

    #[test]
    fn test_rust_parse() {
        let source = r#"
pub struct Point {
    x: i32,
}

impl Point {
    pub fn new(x: i32) -> Self {
        Self { x }
    }
}
"#;
        let result = provider().parse(source, Path::new("point.rs"));
        assert!(result.errors().is_empty());
        assert!(result.warnings().is_empty());
    }
}
