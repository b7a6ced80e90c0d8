//! Python provider.

use crate::parser::treesitter::{GrammarConfig, TreeSitterProvider};
use crate::parser::DetectionRules;

/// Tree-sitter query for counting cyclomatic complexity in Python.
///
/// Counts:
/// - if/elif statements
/// - for/while loops
/// - except clauses
/// - with statements
/// - conditional expressions (ternary)
/// - boolean operators (and, or)
/// - comprehensions
pub const COMPLEXITY_QUERY: &str = r#"
(if_statement) @branch
(elif_clause) @branch
(for_statement) @branch
(while_statement) @branch
(except_clause) @branch
(with_statement) @branch
(conditional_expression) @branch
(boolean_operator operator: "and") @branch
(boolean_operator operator: "or") @branch
(list_comprehension) @branch
(dictionary_comprehension) @branch
(set_comprehension) @branch
(generator_expression) @branch
"#;

pub const RULES: DetectionRules =
    DetectionRules::extensions(&["py", "pyi"]).with_interpreters(&["python"]);

/// Create the Python provider.
pub fn provider() -> TreeSitterProvider {
    TreeSitterProvider::new(GrammarConfig {
        name: "python",
        language_id: "python",
        grammar: tree_sitter_python::LANGUAGE.into(),
        rules: RULES,
    })
}
