//! Syntax providers and language detection.
//!
//! This module provides:
//! - `SyntaxProvider` trait: turns source text into a `SyntaxTree` or signals failure
//! - `ParserRegistry`: ordered provider lookup by path and leading content
//! - Tree-sitter providers for grammar-backed languages and pattern-only
//!   providers for the rest

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

pub mod languages;
pub mod pattern;
pub mod tree;
pub mod treesitter;

pub use pattern::PatternProvider;
pub use tree::{LineIndex, Location, SyntaxTree};
pub use treesitter::TreeSitterProvider;

/// Bytes of leading content inspected when an extension is ambiguous.
const SNIFF_BYTES: usize = 4096;

/// Outcome of running a provider over one source file.
///
/// A missing tree always comes with at least one error.
#[derive(Debug, Clone)]
pub struct ParseResult {
    language: String,
    ast: Option<SyntaxTree>,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ParseResult {
    pub fn success(language: &str, ast: SyntaxTree) -> Self {
        Self {
            language: language.to_string(),
            ast: Some(ast),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn failure(language: &str, error: impl Into<String>) -> Self {
        Self {
            language: language.to_string(),
            ast: None,
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn ast(&self) -> Option<&SyntaxTree> {
        self.ast.as_ref()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_parts(self) -> (String, Option<SyntaxTree>, Vec<String>, Vec<String>) {
        (self.language, self.ast, self.errors, self.warnings)
    }
}

/// Language-specific component turning source text into a syntax tree.
pub trait SyntaxProvider: Send + Sync {
    /// Unique provider name (registry key).
    fn name(&self) -> &str;

    /// Language id of the trees this provider produces (e.g. "typescript").
    fn language(&self) -> &str;

    /// File extensions (without dot) this provider recognises.
    fn extensions(&self) -> &[&'static str];

    /// Whether this provider claims the file, inspecting leading content
    /// when the extension alone is ambiguous.
    fn claims(&self, path: &Path, content: Option<&str>) -> bool;

    /// Parse source text. Never panics; failure is reported in the result.
    fn parse(&self, source: &str, path: &Path) -> ParseResult;

    /// Whether trees carry a concrete grammar tree.
    fn has_grammar(&self) -> bool {
        false
    }
}

/// Extension and content rules a provider uses to claim files.
#[derive(Debug, Clone, Copy)]
pub struct DetectionRules {
    /// Extensions claimed unconditionally (lowercase, no dot).
    pub extensions: &'static [&'static str],
    /// Extensions claimed only when `sniff` accepts the leading content.
    pub ambiguous: &'static [&'static str],
    pub sniff: Option<fn(&str) -> bool>,
    /// Shebang interpreters claimed for files without a known extension.
    pub interpreters: &'static [&'static str],
}

impl DetectionRules {
    pub const fn extensions(extensions: &'static [&'static str]) -> Self {
        Self {
            extensions,
            ambiguous: &[],
            sniff: None,
            interpreters: &[],
        }
    }

    pub const fn with_interpreters(mut self, interpreters: &'static [&'static str]) -> Self {
        self.interpreters = interpreters;
        self
    }

    pub const fn with_sniff(
        mut self,
        ambiguous: &'static [&'static str],
        sniff: fn(&str) -> bool,
    ) -> Self {
        self.ambiguous = ambiguous;
        self.sniff = Some(sniff);
        self
    }

    pub fn claims(&self, path: &Path, content: Option<&str>) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some(ext) if self.ambiguous.contains(&ext) => match (self.sniff, content) {
                (Some(sniff), Some(content)) => sniff(leading(content)),
                _ => false,
            },
            Some(ext) if self.extensions.contains(&ext) => true,
            _ => content
                .and_then(shebang_interpreter)
                .map(|interp| self.interpreters.contains(&interp.as_str()))
                .unwrap_or(false),
        }
    }
}

/// Leading slice of content, cut on a char boundary.
fn leading(content: &str) -> &str {
    if content.len() <= SNIFF_BYTES {
        return content;
    }
    let mut end = SNIFF_BYTES;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

/// Interpreter named by a `#!` line, with version suffixes removed.
///
/// `#!/usr/bin/env python3` and `#!/usr/bin/python3.11` both yield "python".
pub fn shebang_interpreter(content: &str) -> Option<String> {
    let first = content.lines().next()?;
    let rest = first.strip_prefix("#!")?;
    let mut tokens = rest.split_whitespace();
    let program = tokens.next()?;
    let program = program.rsplit('/').next().unwrap_or(program);
    let program = if program == "env" {
        tokens.find(|t| !t.starts_with('-'))?
    } else {
        program
    };
    let name: String = program
        .chars()
        .take_while(|c| !c.is_ascii_digit() && *c != '.')
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Reason text for content that cannot be parsed as source code.
pub(crate) fn binary_content(source: &str) -> Option<String> {
    if source.contains('\0') {
        Some("content contains NUL bytes and is not source text".to_string())
    } else {
        None
    }
}

/// Ordered registry of syntax providers.
///
/// Detection scans providers in registration order and the first provider
/// that claims a file wins. Registering a provider under an existing name
/// replaces it in place.
#[derive(Default)]
pub struct ParserRegistry {
    providers: Vec<Arc<dyn SyntaxProvider>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in provider.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        languages::register_builtin(&mut registry);
        registry
    }

    /// Register a provider. A name collision overwrites the earlier provider.
    pub fn register(&mut self, provider: Arc<dyn SyntaxProvider>) {
        if let Some(slot) = self
            .providers
            .iter_mut()
            .find(|p| p.name() == provider.name())
        {
            warn!(
                provider = provider.name(),
                "syntax provider already registered, overwriting"
            );
            *slot = provider;
            return;
        }
        self.providers.push(provider);
    }

    /// Remove a provider by name.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn SyntaxProvider>> {
        let index = self.providers.iter().position(|p| p.name() == name)?;
        Some(self.providers.remove(index))
    }

    /// Find the first provider claiming the file.
    pub fn detect_and_get_parser(
        &self,
        path: &Path,
        content: Option<&str>,
    ) -> Option<Arc<dyn SyntaxProvider>> {
        self.providers
            .iter()
            .find(|p| p.claims(path, content))
            .cloned()
    }

    /// Detect the language id for a file.
    pub fn detect_language(&self, path: &Path, content: Option<&str>) -> Option<String> {
        self.detect_and_get_parser(path, content)
            .map(|p| p.language().to_string())
    }

    /// First provider registered for a language id.
    pub fn get(&self, language: &str) -> Option<Arc<dyn SyntaxProvider>> {
        self.providers
            .iter()
            .find(|p| p.language() == language)
            .cloned()
    }

    /// Provider registered under a name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn SyntaxProvider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    /// Distinct language ids, in registration order.
    pub fn supported_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = Vec::new();
        for provider in &self.providers {
            if !languages.iter().any(|l| l == provider.language()) {
                languages.push(provider.language().to_string());
            }
        }
        languages
    }

    /// Every extension some provider recognises.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = Vec::new();
        for provider in &self.providers {
            for ext in provider.extensions() {
                if !extensions.contains(ext) {
                    extensions.push(ext);
                }
            }
        }
        extensions
    }

    /// Provider names in registration order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProvider {
        name: &'static str,
        language: &'static str,
        rules: DetectionRules,
    }

    impl SyntaxProvider for MockProvider {
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

        fn parse(&self, source: &str, _path: &Path) -> ParseResult {
            ParseResult::success(self.language, SyntaxTree::pattern_only(Arc::from(source)))
        }
    }

    fn mock(name: &'static str, language: &'static str, exts: &'static [&'static str]) -> Arc<dyn SyntaxProvider> {
        Arc::new(MockProvider {
            name,
            language,
            rules: DetectionRules::extensions(exts),
        })
    }

    #[test]
    fn test_first_registered_provider_wins() {
        let mut registry = ParserRegistry::new();
        registry.register(mock("first", "lang-a", &["x"]));
        registry.register(mock("second", "lang-b", &["x"]));

        let provider = registry
            .detect_and_get_parser(Path::new("file.x"), None)
            .unwrap();
        assert_eq!(provider.name(), "first");
    }

    #[test]
    fn test_name_collision_overwrites() {
        let mut registry = ParserRegistry::new();
        registry.register(mock("dup", "old", &["x"]));
        registry.register(mock("other", "other", &["y"]));
        registry.register(mock("dup", "new", &["x"]));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_by_name("dup").unwrap().language(), "new");
        assert_eq!(registry.provider_names(), vec!["dup", "other"]);
    }

    #[test]
    fn test_unrecognized_extension() {
        let mut registry = ParserRegistry::new();
        registry.register(mock("only", "lang", &["x"]));
        assert!(registry
            .detect_and_get_parser(Path::new("file.unknown"), Some("text"))
            .is_none());
    }

    #[test]
    fn test_supported_languages_in_order() {
        let mut registry = ParserRegistry::new();
        registry.register(mock("b", "beta", &["b"]));
        registry.register(mock("a", "alpha", &["a"]));
        registry.register(mock("b2", "beta", &["bb"]));
        assert_eq!(registry.supported_languages(), vec!["beta", "alpha"]);
    }

    #[test]
    fn test_shebang_interpreter() {
        assert_eq!(
            shebang_interpreter("#!/usr/bin/env python3\nprint(1)"),
            Some("python".to_string())
        );
        assert_eq!(
            shebang_interpreter("#!/usr/bin/python3.11"),
            Some("python".to_string())
        );
        assert_eq!(
            shebang_interpreter("#!/usr/bin/env -S node --harmony"),
            Some("node".to_string())
        );
        assert_eq!(shebang_interpreter("print(1)"), None);
    }

    #[test]
    fn test_ambiguous_extension_sniff() {
        fn looks_special(content: &str) -> bool {
            content.contains("special")
        }
        let rules = DetectionRules::extensions(&["s"]).with_sniff(&["h"], looks_special);
        assert!(rules.claims(Path::new("a.s"), None));
        assert!(rules.claims(Path::new("a.h"), Some("a special header")));
        assert!(!rules.claims(Path::new("a.h"), Some("plain header")));
        assert!(!rules.claims(Path::new("a.h"), None));
    }

    #[test]
    fn test_parse_result_failure_has_error() {
        let result = ParseResult::failure("python", "boom");
        assert!(result.ast().is_none());
        assert_eq!(result.errors(), &["boom".to_string()]);
    }
}
