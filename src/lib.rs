//! Codefacts - multi-language static analysis core.
//!
//! Codefacts detects the language of a source file, parses it into a
//! syntax tree, extracts structured facts (dependencies, exports, functions,
//! classes, identifiers, comments) and derives higher-level views from
//! them, caching results by file path and configuration.
//!
//! # Architecture
//!
//! - `parser`: syntax providers (tree-sitter and pattern-only) and the
//!   ordered `ParserRegistry` used for language detection
//! - `analysis`: per-language AST walkers, fact types and the export
//!   processor chain
//! - `patterns`: per-language pattern tables, module resolution, fallback
//!   extraction and comment mining
//! - `plugin`: the registry shared by extractors and interpreters
//! - `extract` / `interpret`: built-in extractor and interpreter plugins
//! - `cache`: LRU + TTL result cache with optional persistence
//! - `engine`: the `AnalysisEngine` orchestrator
//! - `config` / `error`: configuration surface and error taxonomy
//!
//! # Example
//!
//! ```no_run
//! use codefacts::{AnalysisConfig, AnalysisEngine};
//!
//! let engine = AnalysisEngine::new();
//! let result = engine.analyze_file("src/app.ts", &AnalysisConfig::new())?;
//! for dep in result.dependencies().unwrap_or_default() {
//!     println!("{} (local: {})", dep.source, dep.is_local);
//! }
//! # Ok::<(), codefacts::AnalysisError>(())
//! ```
//!
//! # Adding a New Language
//!
//! Grammar-backed languages implement `LanguageAnalyzer` (see
//! `src/analysis/languages/`) and register a provider in
//! `src/parser/languages/mod.rs`. Pattern-only languages need a table in
//! `src/patterns/tables.rs` and a fallback provider entry.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod interpret;
pub mod parser;
pub mod patterns;
pub mod plugin;

pub use analysis::{
    register_analyzers, ClassExportInfo, ClassInfo, CommentFacts, DependencyInfo, DependencyKind,
    ExportFacts, ExportMethodInfo, ExportType, FunctionInfo, IdentifierInfo, LanguageAnalyzer,
};
pub use cache::{cache_key, CacheReport, CacheStats, ResultCache};
pub use config::{AnalysisConfig, CacheConfig, EngineConfig, ResolvedConfig};
pub use engine::{AnalysisEngine, AnalysisResult, EngineMetrics, PerformanceMetrics};
pub use error::{AnalysisError, ErrorKind, ResultError};
pub use extract::FactSet;
pub use interpret::Interpretation;
pub use parser::{Location, ParseResult, ParserRegistry, SyntaxProvider, SyntaxTree};
pub use plugin::{Plugin, PluginContext, PluginRegistry};

/// Initialize all subsystems.
///
/// Optional: engines initialize lazily. Call once at startup to pay grammar
/// and query setup up front.
pub fn init() {
    register_analyzers();
}
