//! TypeScript and TSX providers.

use crate::parser::treesitter::{GrammarConfig, TreeSitterProvider};
use crate::parser::DetectionRules;

/// Tree-sitter query for counting cyclomatic complexity in TypeScript.
///
/// Counts:
/// - if statements
/// - for loops (regular, for-in, for-of)
/// - while/do-while loops
/// - switch cases
/// - catch clauses
/// - ternary expressions
/// - logical operators (&&, ||, ??)
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

pub const RULES: DetectionRules = DetectionRules::extensions(&["ts", "mts", "cts"]);
pub const TSX_RULES: DetectionRules = DetectionRules::extensions(&["tsx"]);

/// Create the TypeScript provider.
pub fn provider() -> TreeSitterProvider {
    TreeSitterProvider::new(GrammarConfig {
        name: "typescript",
        language_id: "typescript",
        grammar: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        rules: RULES,
    })
}

/// Create the TSX provider. Trees carry the `typescript` language id.
pub fn tsx_provider() -> TreeSitterProvider {
    TreeSitterProvider::new(GrammarConfig {
        name: "tsx",
        language_id: "typescript",
        grammar: tree_sitter_typescript::LANGUAGE_TSX.into(),
        rules: TSX_RULES,
    })
}
