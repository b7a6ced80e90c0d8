//! Tree-sitter backed syntax provider.
//!
//! A single generic provider configured per language with a grammar and the
//! detection rules for the files it claims.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use tree_sitter::{Language, Parser as TsParser};

use super::{binary_content, DetectionRules, ParseResult, SyntaxProvider, SyntaxTree};

/// Configuration for a grammar-backed provider.
#[derive(Clone)]
pub struct GrammarConfig {
    /// Provider name (registry key, e.g. "tsx")
    pub name: &'static str,
    /// Language id of produced trees (e.g. "typescript")
    pub language_id: &'static str,
    /// The tree-sitter grammar
    pub grammar: Language,
    /// Which files this provider claims
    pub rules: DetectionRules,
}

/// Grammar-backed syntax provider.
pub struct TreeSitterProvider {
    config: GrammarConfig,
}

impl TreeSitterProvider {
    pub fn new(config: GrammarConfig) -> Self {
        Self { config }
    }

    pub fn grammar(&self) -> &Language {
        &self.config.grammar
    }

    fn parse_tree(&self, source: &str) -> anyhow::Result<tree_sitter::Tree> {
        let mut parser = TsParser::new();
        parser.set_language(&self.config.grammar)?;
        parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse source"))
    }
}

impl SyntaxProvider for TreeSitterProvider {
    fn name(&self) -> &str {
        self.config.name
    }

    fn language(&self) -> &str {
        self.config.language_id
    }

    fn extensions(&self) -> &[&'static str] {
        self.config.rules.extensions
    }

    fn claims(&self, path: &Path, content: Option<&str>) -> bool {
        self.config.rules.claims(path, content)
    }

    fn parse(&self, source: &str, path: &Path) -> ParseResult {
        let language = self.config.language_id;
        if let Some(reason) = binary_content(source) {
            return ParseResult::failure(language, reason);
        }

        let shared: Arc<str> = Arc::from(source);
        match self.parse_tree(source) {
            Ok(tree) => {
                let syntax_errors = tree.root_node().has_error();
                let result = ParseResult::success(language, SyntaxTree::concrete(tree, shared));
                if syntax_errors {
                    debug!(path = %path.display(), language, "syntax errors in parsed tree");
                    result.with_warning(format!(
                        "{} contains syntax errors; facts near them may be incomplete",
                        path.display()
                    ))
                } else {
                    result
                }
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    language,
                    error = %err,
                    "grammar parse failed, falling back to pattern extraction"
                );
                ParseResult::success(language, SyntaxTree::pattern_only(shared)).with_warning(
                    format!("grammar parse failed ({}); using pattern extraction", err),
                )
            }
        }
    }

    fn has_grammar(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::languages::{go, python};

    #[test]
    fn test_python_provider_parses() {
        let provider = python::provider();
        let source = r#"
def hello():
    print("Hello")

class MyClass:
    def method(self):
        pass
"#;

        let result = provider.parse(source, Path::new("hello.py"));
        assert_eq!(result.language(), "python");
        assert!(result.errors().is_empty());
        let ast = result.ast().unwrap();
        assert!(!ast.is_pattern_only());
        assert_eq!(ast.root().unwrap().kind(), "module");
    }

    #[test]
    fn test_syntax_errors_become_warnings() {
        let provider = python::provider();
        let result = provider.parse("def broken(:\n    pass\n", Path::new("broken.py"));
        assert!(result.ast().is_some());
        assert!(result.errors().is_empty());
        assert!(!result.warnings().is_empty());
    }

    #[test]
    fn test_binary_content_is_parse_failure() {
        let provider = go::provider();
        let result = provider.parse("package main\0\0\0", Path::new("bin.go"));
        assert!(result.ast().is_none());
        assert_eq!(result.errors().len(), 1);
    }
}
