//! The three built-in interpreters.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{find_facts, ExtractedData, Interpretation};
use crate::analysis::{DependencyInfo, ExportType};
use crate::extract::FactSet;
use crate::plugin::{Plugin, PluginContext};

/// Complexity above which `code_metrics` lists a function.
const DEFAULT_COMPLEXITY_THRESHOLD: u32 = 10;

/// Dependency counts and external package names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencySummary {
    pub total: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub local: usize,
    pub external: usize,
    pub resolved: usize,
    pub unresolved_local: usize,
    /// Distinct external packages, sorted.
    pub external_packages: Vec<String>,
    /// Local sources that did not resolve, in source order.
    pub unresolved: Vec<String>,
}

pub struct DependencySummaryInterpreter;

impl Plugin for DependencySummaryInterpreter {
    type Input = ExtractedData;
    type Output = Interpretation;

    fn execute(&self, data: &ExtractedData, context: &PluginContext, _options: &Value) -> anyhow::Result<Interpretation> {
        let deps = find_facts(data, "dependencies", FactSet::as_dependencies)
            .ok_or_else(|| anyhow!("requires the dependencies fact set"))?;
        Ok(Interpretation::DependencySummary(summarize_dependencies(
            deps,
            &context.language,
        )))
    }
}

pub(crate) fn summarize_dependencies(deps: &[DependencyInfo], language: &str) -> DependencySummary {
    let mut summary = DependencySummary {
        total: deps.len(),
        ..Default::default()
    };
    let mut packages = BTreeSet::new();

    for dep in deps {
        *summary.by_kind.entry(dep.kind.to_string()).or_insert(0) += 1;
        if dep.is_local {
            summary.local += 1;
            if dep.resolved_path.is_some() {
                summary.resolved += 1;
            } else {
                summary.unresolved_local += 1;
                summary.unresolved.push(dep.source.clone());
            }
        } else {
            summary.external += 1;
            if let Some(package) = package_name(&dep.source, language) {
                packages.insert(package);
            }
        }
    }

    summary.external_packages = packages.into_iter().collect();
    summary
}

/// Package an external dependency source belongs to.
pub(crate) fn package_name(source: &str, language: &str) -> Option<String> {
    let source = source.trim();
    if source.is_empty() {
        return None;
    }
    let name = match language {
        "typescript" | "javascript" => {
            let source = source.strip_prefix("node:").unwrap_or(source);
            let mut parts = source.split('/');
            match parts.next() {
                Some(scope) if scope.starts_with('@') => match parts.next() {
                    Some(pkg) => format!("{}/{}", scope, pkg),
                    None => scope.to_string(),
                },
                Some(first) => first.to_string(),
                None => return None,
            }
        }
        "python" => source.split('.').next().unwrap_or(source).to_string(),
        "go" => {
            let parts: Vec<&str> = source.split('/').collect();
            if parts[0].contains('.') && parts.len() >= 3 {
                parts[..3].join("/")
            } else {
                source.to_string()
            }
        }
        _ => source
            .split(['/', ':', '.'])
            .find(|s| !s.is_empty())
            .unwrap_or(source)
            .to_string(),
    };
    Some(name)
}

/// Per-class export summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub name: String,
    pub is_default: bool,
    pub method_count: usize,
    pub property_count: usize,
    pub static_members: Vec<String>,
}

/// The public API of one file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSurface {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_export: Option<String>,
    /// Top-level, non-default export names in source order.
    pub named_exports: Vec<String>,
    pub classes: Vec<ClassSummary>,
    /// Modules re-exported from, deduplicated in first-seen order.
    pub reexported_modules: Vec<String>,
}

pub struct ApiSurfaceInterpreter;

impl Plugin for ApiSurfaceInterpreter {
    type Input = ExtractedData;
    type Output = Interpretation;

    fn execute(&self, data: &ExtractedData, _context: &PluginContext, _options: &Value) -> anyhow::Result<Interpretation> {
        let facts = find_facts(data, "exports", FactSet::as_exports)
            .ok_or_else(|| anyhow!("requires the exports fact set"))?;

        let mut surface = ApiSurface {
            total: facts.exports.len(),
            default_export: facts.default_export.clone(),
            ..Default::default()
        };
        for export in &facts.exports {
            *surface
                .by_type
                .entry(export.export_type.to_string())
                .or_insert(0) += 1;
            if !export.is_default && !export.export_type.is_member() {
                surface.named_exports.push(export.name.clone());
            }
            if let Some(module) = &export.source {
                if !surface.reexported_modules.contains(module) {
                    surface.reexported_modules.push(module.clone());
                }
            }
        }

        surface.classes = facts
            .classes
            .iter()
            .map(|class| ClassSummary {
                name: class.name.clone(),
                is_default: class.is_default,
                method_count: class.methods.len(),
                property_count: class.properties.len(),
                static_members: class
                    .methods
                    .iter()
                    .chain(&class.properties)
                    .filter(|m| m.is_static == Some(true))
                    .map(|m| m.name.clone())
                    .collect(),
            })
            .collect();

        Ok(Interpretation::ApiSurface(surface))
    }

    fn validate(&self, output: &Interpretation) -> bool {
        match output {
            Interpretation::ApiSurface(surface) => {
                surface.by_type.values().sum::<usize>() == surface.total
                    && surface.by_type.get(ExportType::Class.as_str()).copied().unwrap_or(0)
                        >= surface.classes.len()
            }
            _ => false,
        }
    }
}

/// A function above the complexity threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexFunction {
    pub name: String,
    pub complexity: u32,
    pub line: usize,
}

/// Size and complexity figures for one file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMetrics {
    pub function_count: usize,
    pub method_count: usize,
    pub average_complexity: f64,
    pub max_complexity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_complex_function: Option<String>,
    pub average_function_length: f64,
    pub complexity_threshold: u32,
    pub complex_functions: Vec<ComplexFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo_count: Option<usize>,
    pub todos_by_marker: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary_size: Option<usize>,
}

/// Options: `{"complexityThreshold": n}`.
pub struct CodeMetricsInterpreter;

impl Plugin for CodeMetricsInterpreter {
    type Input = ExtractedData;
    type Output = Interpretation;

    fn execute(&self, data: &ExtractedData, _context: &PluginContext, options: &Value) -> anyhow::Result<Interpretation> {
        let functions = find_facts(data, "functions", FactSet::as_functions)
            .ok_or_else(|| anyhow!("requires the functions fact set"))?;
        let threshold = options
            .get("complexityThreshold")
            .and_then(Value::as_u64)
            .map(|t| t.min(u32::MAX as u64) as u32)
            .unwrap_or(DEFAULT_COMPLEXITY_THRESHOLD);

        let mut metrics = CodeMetrics {
            function_count: functions.len(),
            method_count: functions.iter().filter(|f| f.is_method()).count(),
            complexity_threshold: threshold,
            ..Default::default()
        };

        if !functions.is_empty() {
            let count = functions.len() as f64;
            let total_complexity: u64 = functions.iter().map(|f| f.complexity as u64).sum();
            let total_lines: usize = functions.iter().map(|f| f.line_count).sum();
            metrics.average_complexity = total_complexity as f64 / count;
            metrics.average_function_length = total_lines as f64 / count;

            // first function wins ties
            if let Some(most) = functions
                .iter()
                .reduce(|best, f| if f.complexity > best.complexity { f } else { best })
            {
                metrics.max_complexity = most.complexity;
                metrics.most_complex_function = Some(most.qualified_name());
            }
        }

        metrics.complex_functions = functions
            .iter()
            .filter(|f| f.complexity > threshold)
            .map(|f| ComplexFunction {
                name: f.qualified_name(),
                complexity: f.complexity,
                line: f.location.line,
            })
            .collect();

        if let Some(comments) = find_facts(data, "comments", FactSet::as_comments) {
            metrics.comment_count = Some(comments.comments.len());
            metrics.todo_count = Some(comments.todos.len());
            for todo in &comments.todos {
                *metrics.todos_by_marker.entry(todo.marker.clone()).or_insert(0) += 1;
            }
        }
        metrics.vocabulary_size =
            find_facts(data, "identifiers", FactSet::as_identifiers).map(|ids| ids.len());

        Ok(Interpretation::CodeMetrics(metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        exports::finalize, CommentFacts, DependencyKind, ExportMethodInfo, FunctionInfo, TodoInfo,
    };
    use crate::parser::Location;

    fn dep(source: &str, is_local: bool, resolved: Option<&str>) -> DependencyInfo {
        DependencyInfo {
            source: source.to_string(),
            kind: DependencyKind::Import,
            is_local,
            line: 1,
            resolved_path: resolved.map(str::to_string),
        }
    }

    fn function(name: &str, parent: Option<&str>, complexity: u32, line_count: usize) -> FunctionInfo {
        FunctionInfo {
            name: name.to_string(),
            kind: if parent.is_some() { "method" } else { "function" }.to_string(),
            parent: parent.map(str::to_string),
            location: Location {
                line: 3,
                column: 1,
                end_line: 3 + line_count,
                end_column: 1,
            },
            parameters: vec![],
            is_async: false,
            is_exported: false,
            line_count,
            complexity,
        }
    }

    fn context() -> PluginContext {
        PluginContext::new("src/app.ts", "typescript")
    }

    #[test]
    fn test_dependency_summary() {
        let mut data = ExtractedData::new();
        data.insert(
            "dependencies".to_string(),
            Some(FactSet::Dependencies(vec![
                dep("./a", true, Some("/p/a.ts")),
                dep("./b", true, None),
                dep("@scope/pkg/sub", false, None),
                dep("lodash/fp", false, None),
                dep("lodash", false, None),
            ])),
        );

        let Interpretation::DependencySummary(summary) = DependencySummaryInterpreter
            .execute(&data, &context(), &Value::Null)
            .unwrap()
        else {
            panic!("wrong interpretation");
        };
        assert_eq!(summary.total, 5);
        assert_eq!(summary.local, 2);
        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.unresolved, vec!["./b"]);
        assert_eq!(summary.external_packages, vec!["@scope/pkg", "lodash"]);
        assert_eq!(summary.by_kind["import"], 5);
    }

    #[test]
    fn test_package_names_by_language() {
        assert_eq!(package_name("os.path", "python").as_deref(), Some("os"));
        assert_eq!(
            package_name("github.com/spf13/cobra/doc", "go").as_deref(),
            Some("github.com/spf13/cobra")
        );
        assert_eq!(package_name("net/http", "go").as_deref(), Some("net/http"));
        assert_eq!(package_name("serde::Serialize", "rust").as_deref(), Some("serde"));
        assert_eq!(package_name("node:fs", "javascript").as_deref(), Some("fs"));
    }

    #[test]
    fn test_missing_fact_set_fails() {
        let data = ExtractedData::new();
        assert!(DependencySummaryInterpreter.execute(&data, &context(), &Value::Null).is_err());
        assert!(ApiSurfaceInterpreter.execute(&data, &context(), &Value::Null).is_err());
        assert!(CodeMetricsInterpreter.execute(&data, &context(), &Value::Null).is_err());
    }

    #[test]
    fn test_api_surface() {
        let loc = Location::default();
        let facts = finalize(vec![
            ExportMethodInfo::new("Service", ExportType::Class, "class_declaration", loc).default_export(),
            ExportMethodInfo::new("create", ExportType::ClassMethod, "method_definition", loc).member_of("Service"),
            {
                let mut m = ExportMethodInfo::new("instance", ExportType::ClassProperty, "public_field_definition", loc)
                    .member_of("Service");
                m.is_static = Some(true);
                m
            },
            ExportMethodInfo::new("helper", ExportType::Function, "function_declaration", loc),
            ExportMethodInfo::new("* from ./all", ExportType::ReExport, "export_star", loc).from_module("./all"),
        ]);
        let mut data = ExtractedData::new();
        data.insert("exports".to_string(), Some(FactSet::Exports(facts)));

        let output = ApiSurfaceInterpreter.execute(&data, &context(), &Value::Null).unwrap();
        assert!(ApiSurfaceInterpreter.validate(&output));
        let Interpretation::ApiSurface(surface) = output else {
            panic!("wrong interpretation");
        };
        assert_eq!(surface.total, 5);
        assert_eq!(surface.default_export.as_deref(), Some("Service"));
        assert_eq!(surface.named_exports, vec!["helper", "* from ./all"]);
        assert_eq!(surface.reexported_modules, vec!["./all"]);
        assert_eq!(surface.classes.len(), 1);
        assert_eq!(surface.classes[0].method_count, 1);
        assert_eq!(surface.classes[0].static_members, vec!["instance"]);
    }

    #[test]
    fn test_code_metrics() {
        let mut data = ExtractedData::new();
        data.insert(
            "functions".to_string(),
            Some(FactSet::Functions(vec![
                function("parse", None, 12, 40),
                function("run", Some("Engine"), 12, 10),
                function("tiny", None, 1, 2),
            ])),
        );
        data.insert(
            "comments".to_string(),
            Some(FactSet::Comments(CommentFacts {
                comments: vec![],
                todos: vec![
                    TodoInfo { marker: "TODO".to_string(), text: "a".to_string(), line: 1 },
                    TodoInfo { marker: "FIXME".to_string(), text: "b".to_string(), line: 2 },
                    TodoInfo { marker: "TODO".to_string(), text: "c".to_string(), line: 3 },
                ],
                annotations: vec![],
            })),
        );

        let options = serde_json::json!({"complexityThreshold": 11});
        let Interpretation::CodeMetrics(metrics) =
            CodeMetricsInterpreter.execute(&data, &context(), &options).unwrap()
        else {
            panic!("wrong interpretation");
        };
        assert_eq!(metrics.function_count, 3);
        assert_eq!(metrics.method_count, 1);
        assert_eq!(metrics.max_complexity, 12);
        assert_eq!(metrics.most_complex_function.as_deref(), Some("parse"));
        assert!((metrics.average_complexity - 25.0 / 3.0).abs() < 1e-9);
        assert!((metrics.average_function_length - 52.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.complex_functions.len(), 2);
        assert_eq!(metrics.complex_functions[1].name, "Engine.run");
        assert_eq!(metrics.todo_count, Some(3));
        assert_eq!(metrics.todos_by_marker["TODO"], 2);
        assert_eq!(metrics.vocabulary_size, None);
    }
}
