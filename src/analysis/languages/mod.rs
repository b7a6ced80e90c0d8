//! Language-specific analyzer implementations.

mod ecmascript;
mod go;
mod java;
mod javascript;
mod python;
mod rust_lang;
mod typescript;

pub use go::GoAnalyzer;
pub use java::JavaAnalyzer;
pub use javascript::JavaScriptAnalyzer;
pub use python::PythonAnalyzer;
pub use rust_lang::RustAnalyzer;
pub use typescript::TypeScriptAnalyzer;

use super::LanguageAnalyzer;
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// Static storage for Go analyzer.
static GO_ANALYZER: OnceCell<GoAnalyzer> = OnceCell::new();

/// Static storage for Java analyzer.
static JAVA_ANALYZER: OnceCell<JavaAnalyzer> = OnceCell::new();

/// Static storage for JavaScript analyzer.
static JAVASCRIPT_ANALYZER: OnceCell<JavaScriptAnalyzer> = OnceCell::new();

/// Static storage for Python analyzer.
static PYTHON_ANALYZER: OnceCell<PythonAnalyzer> = OnceCell::new();

/// Static storage for Rust analyzer.
static RUST_ANALYZER: OnceCell<RustAnalyzer> = OnceCell::new();

/// Static storage for TypeScript analyzer.
static TYPESCRIPT_ANALYZER: OnceCell<TypeScriptAnalyzer> = OnceCell::new();

/// Whether analyzers have been registered.
static REGISTERED: AtomicBool = AtomicBool::new(false);

/// Register all available language analyzers.
///
/// This is idempotent - calling it multiple times is safe.
pub fn register_analyzers() {
    if REGISTERED.swap(true, Ordering::SeqCst) {
        return; // Already registered
    }

    GO_ANALYZER.get_or_init(GoAnalyzer::new);
    JAVA_ANALYZER.get_or_init(JavaAnalyzer::new);
    JAVASCRIPT_ANALYZER.get_or_init(JavaScriptAnalyzer::new);
    PYTHON_ANALYZER.get_or_init(PythonAnalyzer::new);
    RUST_ANALYZER.get_or_init(RustAnalyzer::new);
    TYPESCRIPT_ANALYZER.get_or_init(TypeScriptAnalyzer::new);
}

/// Get the analyzer for a language id.
///
/// Returns None for languages without a grammar; those are handled by the
/// pattern tables.
pub fn get_analyzer(lang_id: &str) -> Option<&'static dyn LanguageAnalyzer> {
    match lang_id {
        "go" => Some(GO_ANALYZER.get_or_init(GoAnalyzer::new) as &'static dyn LanguageAnalyzer),
        "java" => Some(JAVA_ANALYZER.get_or_init(JavaAnalyzer::new) as &'static dyn LanguageAnalyzer),
        "javascript" => {
            Some(JAVASCRIPT_ANALYZER.get_or_init(JavaScriptAnalyzer::new) as &'static dyn LanguageAnalyzer)
        }
        "python" => Some(PYTHON_ANALYZER.get_or_init(PythonAnalyzer::new) as &'static dyn LanguageAnalyzer),
        "rust" => Some(RUST_ANALYZER.get_or_init(RustAnalyzer::new) as &'static dyn LanguageAnalyzer),
        "typescript" => {
            Some(TYPESCRIPT_ANALYZER.get_or_init(TypeScriptAnalyzer::new) as &'static dyn LanguageAnalyzer)
        }
        _ => None,
    }
}

/// Language ids with a grammar-backed analyzer.
pub fn registered_languages() -> Vec<String> {
    vec![
        "go".to_string(),
        "java".to_string(),
        "javascript".to_string(),
        "python".to_string(),
        "rust".to_string(),
        "typescript".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_registered_language_has_analyzer() {
        register_analyzers();
        for language in registered_languages() {
            let analyzer = get_analyzer(&language).unwrap();
            assert_eq!(analyzer.language_id(), language);
        }
        assert!(get_analyzer("ruby").is_none());
    }
}
