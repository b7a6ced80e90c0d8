//! Built-in syntax providers.
//!
//! Each grammar-backed language module provides:
//! - Detection rules (extensions, shebang interpreters)
//! - Complexity counting query used by the function extractor
//! - Factory function for its provider
//!
//! Languages without a grammar are listed in [`fallback`].

pub mod fallback;
pub mod go;
pub mod java;
pub mod javascript;
pub mod python;
pub mod rust_lang;
pub mod typescript;

use std::sync::Arc;

use super::ParserRegistry;

/// Register every built-in provider. Grammar-backed providers come first so
/// they get first claim on any extension they share with a pattern table.
pub fn register_builtin(registry: &mut ParserRegistry) {
    registry.register(Arc::new(typescript::provider()));
    registry.register(Arc::new(typescript::tsx_provider()));
    registry.register(Arc::new(javascript::provider()));
    registry.register(Arc::new(python::provider()));
    registry.register(Arc::new(go::provider()));
    registry.register(Arc::new(java::provider()));
    registry.register(Arc::new(rust_lang::provider()));
    fallback::register(registry);
}

/// Complexity query for a grammar-backed language id.
pub fn complexity_query(language: &str) -> Option<&'static str> {
    match language {
        "typescript" => Some(typescript::COMPLEXITY_QUERY),
        "javascript" => Some(javascript::COMPLEXITY_QUERY),
        "python" => Some(python::COMPLEXITY_QUERY),
        "go" => Some(go::COMPLEXITY_QUERY),
        "java" => Some(java::COMPLEXITY_QUERY),
        "rust" => Some(rust_lang::COMPLEXITY_QUERY),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn detect(path: &str, content: Option<&str>) -> Option<String> {
        ParserRegistry::with_builtin().detect_language(Path::new(path), content)
    }

    #[test]
    fn test_builtin_detection() {
        assert_eq!(detect("src/app.ts", None).as_deref(), Some("typescript"));
        assert_eq!(detect("src/App.tsx", None).as_deref(), Some("typescript"));
        assert_eq!(detect("lib/index.mjs", None).as_deref(), Some("javascript"));
        assert_eq!(detect("tool/run.py", None).as_deref(), Some("python"));
        assert_eq!(detect("main.go", None).as_deref(), Some("go"));
        assert_eq!(detect("Main.java", None).as_deref(), Some("java"));
        assert_eq!(detect("lib.rs", None).as_deref(), Some("rust"));
        assert_eq!(detect("app.rb", None).as_deref(), Some("ruby"));
        assert_eq!(detect("notes.txt", Some("hello")), None);
    }

    #[test]
    fn test_shebang_detection() {
        assert_eq!(
            detect("bin/tool", Some("#!/usr/bin/env python3\nimport os\n")).as_deref(),
            Some("python")
        );
        assert_eq!(
            detect("bin/serve", Some("#!/usr/bin/env node\nrequire('x')\n")).as_deref(),
            Some("javascript")
        );
        assert_eq!(
            detect("bin/task", Some("#!/usr/bin/env ruby\nputs 1\n")).as_deref(),
            Some("ruby")
        );
    }

    #[test]
    fn test_header_sniffing() {
        assert_eq!(
            detect("widget.h", Some("#pragma once\nnamespace ui {\nclass Widget;\n}\n")).as_deref(),
            Some("cpp")
        );
        assert_eq!(
            detect("util.h", Some("#include <stdio.h>\nint add(int a, int b);\n")).as_deref(),
            Some("c")
        );
    }

    #[test]
    fn test_grammar_languages_listed_first() {
        let languages = ParserRegistry::with_builtin().supported_languages();
        assert_eq!(
            &languages[..6],
            &["typescript", "javascript", "python", "go", "java", "rust"]
        );
        assert!(languages.contains(&"ruby".to_string()));
    }

    #[test]
    fn test_complexity_query_lookup() {
        assert!(complexity_query("python").is_some());
        assert!(complexity_query("ruby").is_none());
    }
}
