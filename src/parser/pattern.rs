//! Provider for languages without a grammar.
//!
//! Produces source-only trees; extraction then runs entirely on the
//! language's pattern table.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::{binary_content, DetectionRules, ParseResult, SyntaxProvider, SyntaxTree};

/// Pattern-only syntax provider.
pub struct PatternProvider {
    name: &'static str,
    language: &'static str,
    rules: DetectionRules,
}

impl PatternProvider {
    pub const fn new(name: &'static str, language: &'static str, rules: DetectionRules) -> Self {
        Self {
            name,
            language,
            rules,
        }
    }
}

impl SyntaxProvider for PatternProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn language(&self) -> &str {
        self.language
    }

    fn extensions(&self) -> &[&'static str] {
        self.rules.extensions
    }

    fn claims(&self, path: &Path, content: Option<&str>) -> bool {
        self.rules.claims(path, content)
    }

    fn parse(&self, source: &str, path: &Path) -> ParseResult {
        if let Some(reason) = binary_content(source) {
            return ParseResult::failure(self.language, reason);
        }
        info!(
            path = %path.display(),
            language = self.language,
            "no grammar available, using pattern extraction"
        );
        ParseResult::success(self.language, SyntaxTree::pattern_only(Arc::from(source)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_provider_tree() {
        let provider = PatternProvider::new("ruby", "ruby", DetectionRules::extensions(&["rb"]));
        let result = provider.parse("require 'json'\n", Path::new("app.rb"));
        assert!(result.errors().is_empty());
        assert!(result.ast().unwrap().is_pattern_only());
        assert!(!provider.has_grammar());
    }
}
