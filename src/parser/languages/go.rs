//! Go provider.

use crate::parser::treesitter::{GrammarConfig, TreeSitterProvider};
use crate::parser::DetectionRules;

/// Tree-sitter query for counting cyclomatic complexity in Go.
///
/// Counts:
/// - if statements
/// - for loops (Go's only loop construct)
/// - switch/select statements and their cases
/// - logical operators (&&, ||)
pub const COMPLEXITY_QUERY: &str = r#"
(if_statement) @branch
(for_statement) @branch
(expression_switch_statement) @branch
(type_switch_statement) @branch
(select_statement) @branch
(communication_case) @branch
(expression_case) @branch
(type_case) @branch
(binary_expression operator: "&&") @branch
(binary_expression operator: "||") @branch
"#;

pub const RULES: DetectionRules = DetectionRules::extensions(&["go"]);

/// Create the Go provider.
pub fn provider() -> TreeSitterProvider {
    TreeSitterProvider::new(GrammarConfig {
        name: "go",
        language_id: "go",
        grammar: tree_sitter_go::LANGUAGE.into(),
        rules: RULES,
    })
}
