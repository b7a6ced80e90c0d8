//! Built-in interpreter plugins.
//!
//! Interpreters consume the fact sets produced by the extractors of one
//! analysis and derive higher-level views. Each one fails (and is isolated
//! by the registry) when a fact set it requires is absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extract::FactSet;
use crate::plugin::{Plugin, PluginRegistry};

mod builtin;

pub use builtin::{
    ApiSurface, ApiSurfaceInterpreter, ClassSummary, CodeMetrics, CodeMetricsInterpreter,
    ComplexFunction, DependencySummary, DependencySummaryInterpreter,
};

/// Names of the built-in interpreters, in registration order.
pub const BUILTIN_INTERPRETERS: &[&str] = &["dependency_summary", "api_surface", "code_metrics"];

/// Extractor outputs keyed by extractor name. `None` marks a failed extractor.
pub type ExtractedData = BTreeMap<String, Option<FactSet>>;

/// Output of one interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Interpretation {
    DependencySummary(DependencySummary),
    ApiSurface(ApiSurface),
    CodeMetrics(CodeMetrics),
    Custom(serde_json::Value),
}

/// An interpreter plugin.
pub type Interpreter = dyn Plugin<Input = ExtractedData, Output = Interpretation>;

/// Registry of interpreter plugins.
pub type InterpreterRegistry = PluginRegistry<ExtractedData, Interpretation>;

/// Create a registry holding every built-in interpreter.
pub fn builtin_registry() -> InterpreterRegistry {
    let mut registry = InterpreterRegistry::new("interpreter");
    registry.register("dependency_summary", Box::new(DependencySummaryInterpreter));
    registry.register("api_surface", Box::new(ApiSurfaceInterpreter));
    registry.register("code_metrics", Box::new(CodeMetricsInterpreter));
    registry
}

/// First successful fact set the projection accepts.
///
/// The extractor of the same name is preferred, so a plugin registered
/// under a built-in name shadows any other producer of that kind.
pub fn find_facts<'a, T: ?Sized>(
    data: &'a ExtractedData,
    name: &str,
    project: impl Fn(&'a FactSet) -> Option<&'a T>,
) -> Option<&'a T> {
    if let Some(found) = data.get(name).and_then(Option::as_ref).and_then(&project) {
        return Some(found);
    }
    data.values().flatten().find_map(project)
}
