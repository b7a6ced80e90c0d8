//! Pattern-only providers for languages without a grammar.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::parser::{DetectionRules, ParserRegistry, PatternProvider};

lazy_static! {
    static ref CPP_MARKERS: Regex = Regex::new(
        r"(?m)^\s*(namespace\s+\w+|template\s*<|class\s+\w+[^;]*\{|(public|private|protected)\s*:|using\s+namespace\b|#include\s*<(iostream|string|vector|memory|map)>)|std::"
    )
    .unwrap();
}

/// Whether header content looks like C++ rather than C.
fn looks_like_cpp(content: &str) -> bool {
    CPP_MARKERS.is_match(content)
}

/// Pattern-only languages in registration order. `cpp` precedes `c` so it
/// gets first claim on `.h` headers.
pub const PROVIDERS: &[(&str, DetectionRules)] = &[
    (
        "ruby",
        DetectionRules::extensions(&["rb", "rake", "gemspec"]).with_interpreters(&["ruby"]),
    ),
    (
        "php",
        DetectionRules::extensions(&["php"]).with_interpreters(&["php"]),
    ),
    ("csharp", DetectionRules::extensions(&["cs"])),
    ("kotlin", DetectionRules::extensions(&["kt", "kts"])),
    ("swift", DetectionRules::extensions(&["swift"])),
    ("scala", DetectionRules::extensions(&["scala", "sc"])),
    (
        "cpp",
        DetectionRules::extensions(&["cpp", "cc", "cxx", "hpp", "hh", "hxx"])
            .with_sniff(&["h"], looks_like_cpp),
    ),
    ("c", DetectionRules::extensions(&["c", "h"])),
];

/// Register every pattern-only provider.
pub fn register(registry: &mut ParserRegistry) {
    for &(language, rules) in PROVIDERS {
        registry.register(Arc::new(PatternProvider::new(language, language, rules)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpp_sniff() {
        assert!(looks_like_cpp("namespace app {\n}\n"));
        assert!(looks_like_cpp("template <typename T>\nT max(T a, T b);\n"));
        assert!(looks_like_cpp("std::string name();\n"));
        assert!(!looks_like_cpp("#include <stdio.h>\nstruct point { int x; };\n"));
    }

    #[test]
    fn test_every_fallback_registered() {
        let mut registry = ParserRegistry::new();
        register(&mut registry);
        assert_eq!(registry.len(), PROVIDERS.len());
        assert!(!registry.get("ruby").unwrap().has_grammar());
    }
}
