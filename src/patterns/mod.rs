//! Per-language pattern tables.
//!
//! Every supported language has a [`LanguageConfig`]: dependency, export,
//! comment, function and class patterns plus a locality rule and an optional
//! resolver. Grammar-backed languages use their table for locality,
//! resolution and re-export supplementation; pattern-only languages (and
//! grammar languages whose parse failed) extract everything from it.

use std::path::Path;

use regex::Regex;

use crate::analysis::{DependencyKind, ExportType};

pub mod comments;
pub mod fallback;
pub mod resolver;
mod tables;

pub use fallback::{extract_facts, PatternFacts};
pub use resolver::{Candidate, Resolver};

/// How a dependency pattern's `source` capture is split into sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSplit {
    /// The capture is one source.
    Single,
    /// Comma separated modules, each optionally aliased (`import a as b, c`).
    Commas,
    /// Every double-quoted string inside the capture (Go import blocks).
    QuotedStrings,
}

/// Scanner for one dependency form.
pub struct DependencyPattern {
    /// Regex with a named `source` group.
    pub scanner: Regex,
    pub kind: DependencyKind,
    pub split: SourceSplit,
    pub is_local: fn(&str) -> bool,
}

/// Scanner for one export form.
pub struct ExportPattern {
    /// Regex with a named `name` group.
    pub scanner: Regex,
    pub export_type: ExportType,
    pub is_default: bool,
    /// Accepts or rejects a match given (name, matched text).
    pub accept: fn(&str, &str) -> bool,
}

/// How a declaration's body extent is estimated without a grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Braces,
    Indent,
}

/// Static per-language pattern table.
pub struct LanguageConfig {
    pub language: &'static str,
    pub dependency_patterns: Vec<DependencyPattern>,
    pub export_patterns: Vec<ExportPattern>,
    /// Matches every comment form of the language.
    pub comment_pattern: Regex,
    /// Regexes with named `name` and `params` groups (optional `indent`, `receiver`).
    pub function_patterns: Vec<Regex>,
    /// Regex with named `name` and `kind` groups (optional `heritage`).
    pub class_pattern: Option<Regex>,
    pub block_style: BlockStyle,
    /// Locality of dependencies found by a grammar walk.
    pub locality: fn(&str, DependencyKind) -> bool,
    pub resolver: Option<Resolver>,
    /// Whether `export ... from` re-exports are supplemented from source text.
    pub reexports: bool,
}

impl LanguageConfig {
    pub fn is_local(&self, source: &str, kind: DependencyKind) -> bool {
        (self.locality)(source, kind)
    }

    /// Resolve a local dependency to an existing path.
    pub fn resolve(&self, file_path: &Path, source: &str, kind: DependencyKind) -> Option<String> {
        self.resolver
            .as_ref()
            .and_then(|r| r.resolve(file_path, source, kind))
    }
}

/// Pattern table for a language id.
pub fn config_for(language: &str) -> Option<&'static LanguageConfig> {
    tables::CONFIGS.iter().find(|c| c.language == language)
}

/// Language ids with a pattern table.
pub fn languages() -> impl Iterator<Item = &'static str> {
    tables::CONFIGS.iter().map(|c| c.language)
}

/// Accepts every match.
pub(crate) fn accept_all(_name: &str, _matched: &str) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_language_has_table() {
        for language in [
            "typescript", "javascript", "python", "go", "java", "rust", "ruby", "php", "csharp",
            "kotlin", "swift", "scala", "cpp", "c",
        ] {
            assert!(config_for(language).is_some(), "missing table for {}", language);
        }
        assert!(config_for("cobol").is_none());
    }

    #[test]
    fn test_locality_rules() {
        let ts = config_for("typescript").unwrap();
        assert!(ts.is_local("./x", DependencyKind::Import));
        assert!(!ts.is_local("react", DependencyKind::Import));

        let rust = config_for("rust").unwrap();
        assert!(rust.is_local("crate::config", DependencyKind::Use));
        assert!(rust.is_local("parser", DependencyKind::Include));
        assert!(!rust.is_local("serde::Serialize", DependencyKind::Use));

        let java = config_for("java").unwrap();
        assert!(!java.is_local("com.example.Foo", DependencyKind::Import));
    }
}
