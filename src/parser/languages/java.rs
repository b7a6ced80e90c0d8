//! Java provider.

use crate::parser::treesitter::{GrammarConfig, TreeSitterProvider};
use crate::parser::DetectionRules;

/// Tree-sitter query for counting cyclomatic complexity in Java.
pub const COMPLEXITY_QUERY: &str = r#"
(if_statement) @branch
(for_statement) @branch
(enhanced_for_statement) @branch
(while_statement) @branch
(do_statement) @branch
(switch_expression) @branch
(switch_block_statement_group) @branch
(catch_clause) @branch
(ternary_expression) @branch
(binary_expression operator: "&&") @branch
(binary_expression operator: "||") @branch
"#;

pub const RULES: DetectionRules = DetectionRules::extensions(&["java"]);

/// Create the Java provider.
pub fn provider() -> TreeSitterProvider {
    TreeSitterProvider::new(GrammarConfig {
        name: "java",
        language_id: "java",
        grammar: tree_sitter_java::LANGUAGE.into(),
        rules: RULES,
    })
}
