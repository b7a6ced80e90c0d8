//! Built-in extractor plugins.
//!
//! Each extractor turns one syntax tree into one [`FactSet`]. Trees with a
//! concrete grammar tree are walked by the language's
//! [`LanguageAnalyzer`](crate::analysis::LanguageAnalyzer); pattern-only
//! trees, and languages without an analyzer, go through the language's
//! pattern table instead.

use serde::{Deserialize, Serialize};

use crate::analysis::{
    ClassInfo, CommentFacts, DependencyInfo, ExportFacts, FunctionInfo, IdentifierInfo,
};
use crate::plugin::{Plugin, PluginRegistry};
use crate::parser::SyntaxTree;

mod builtin;

pub use builtin::{
    ClassExtractor, CommentExtractor, DependencyExtractor, ExportExtractor, FunctionExtractor,
    IdentifierExtractor,
};

/// Names of the built-in extractors, in registration order.
pub const BUILTIN_EXTRACTORS: &[&str] = &[
    "dependencies",
    "exports",
    "functions",
    "classes",
    "identifiers",
    "comments",
];

/// Output of one extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum FactSet {
    Dependencies(Vec<DependencyInfo>),
    Exports(ExportFacts),
    Functions(Vec<FunctionInfo>),
    Classes(Vec<ClassInfo>),
    Identifiers(Vec<IdentifierInfo>),
    Comments(CommentFacts),
    Custom(serde_json::Value),
}

impl FactSet {
    pub fn kind(&self) -> &'static str {
        match self {
            FactSet::Dependencies(_) => "dependencies",
            FactSet::Exports(_) => "exports",
            FactSet::Functions(_) => "functions",
            FactSet::Classes(_) => "classes",
            FactSet::Identifiers(_) => "identifiers",
            FactSet::Comments(_) => "comments",
            FactSet::Custom(_) => "custom",
        }
    }

    pub fn as_dependencies(&self) -> Option<&[DependencyInfo]> {
        match self {
            FactSet::Dependencies(deps) => Some(deps),
            _ => None,
        }
    }

    pub fn as_exports(&self) -> Option<&ExportFacts> {
        match self {
            FactSet::Exports(exports) => Some(exports),
            _ => None,
        }
    }

    pub fn as_functions(&self) -> Option<&[FunctionInfo]> {
        match self {
            FactSet::Functions(functions) => Some(functions),
            _ => None,
        }
    }

    pub fn as_classes(&self) -> Option<&[ClassInfo]> {
        match self {
            FactSet::Classes(classes) => Some(classes),
            _ => None,
        }
    }

    pub fn as_identifiers(&self) -> Option<&[IdentifierInfo]> {
        match self {
            FactSet::Identifiers(identifiers) => Some(identifiers),
            _ => None,
        }
    }

    pub fn as_comments(&self) -> Option<&CommentFacts> {
        match self {
            FactSet::Comments(comments) => Some(comments),
            _ => None,
        }
    }

    /// Number of top-level facts.
    pub fn len(&self) -> usize {
        match self {
            FactSet::Dependencies(v) => v.len(),
            FactSet::Exports(e) => e.exports.len(),
            FactSet::Functions(v) => v.len(),
            FactSet::Classes(v) => v.len(),
            FactSet::Identifiers(v) => v.len(),
            FactSet::Comments(c) => c.comments.len(),
            FactSet::Custom(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An extractor plugin.
pub type Extractor = dyn Plugin<Input = SyntaxTree, Output = FactSet>;

/// Registry of extractor plugins.
pub type ExtractorRegistry = PluginRegistry<SyntaxTree, FactSet>;

/// Create a registry holding every built-in extractor.
pub fn builtin_registry() -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new("extractor");
    registry.register("dependencies", Box::new(DependencyExtractor));
    registry.register("exports", Box::new(ExportExtractor));
    registry.register("functions", Box::new(FunctionExtractor));
    registry.register("classes", Box::new(ClassExtractor));
    registry.register("identifiers", Box::new(IdentifierExtractor));
    registry.register("comments", Box::new(CommentExtractor));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registration_order() {
        let registry = builtin_registry();
        assert_eq!(registry.names(), BUILTIN_EXTRACTORS);
    }

    #[test]
    fn test_fact_set_wire_format() {
        let facts = FactSet::Dependencies(vec![]);
        let json = serde_json::to_value(&facts).unwrap();
        assert_eq!(json["kind"], "dependencies");
        assert!(json["data"].as_array().unwrap().is_empty());

        let back: FactSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, facts);
        assert!(back.is_empty());
    }
}
