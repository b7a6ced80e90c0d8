//! The six built-in extractors.

use std::collections::HashSet;
use std::path::Path;

use anyhow::anyhow;
use serde_json::Value;
use tracing::debug;

use super::FactSet;
use crate::analysis::exports::{finalize, reexport_anchors, supplement_reexports};
use crate::analysis::{get_analyzer, DependencyInfo, LanguageAnalyzer};
use crate::parser::SyntaxTree;
use crate::patterns::fallback::{self, Scan};
use crate::patterns::{comments, config_for, LanguageConfig};
use crate::plugin::{Plugin, PluginContext};

/// Where an extractor takes its facts from for one tree.
enum Route {
    Grammar(&'static dyn LanguageAnalyzer),
    Patterns(&'static LanguageConfig),
}

fn route(extractor: &str, tree: &SyntaxTree, context: &PluginContext) -> anyhow::Result<Route> {
    if !tree.is_pattern_only() {
        if let Some(analyzer) = get_analyzer(&context.language) {
            return Ok(Route::Grammar(analyzer));
        }
    }
    let config = config_for(&context.language)
        .ok_or_else(|| anyhow!("no analyzer or pattern table for language '{}'", context.language))?;
    debug!(
        extractor,
        path = %context.file_path.display(),
        language = %context.language,
        "using pattern extraction"
    );
    Ok(Route::Patterns(config))
}

fn supports_language(language: &str) -> bool {
    get_analyzer(language).is_some() || config_for(language).is_some()
}

/// Import, require, include and use facts with locality and resolution.
///
/// Options: `{"resolve": false}` skips on-disk resolution.
pub struct DependencyExtractor;

impl Plugin for DependencyExtractor {
    type Input = SyntaxTree;
    type Output = FactSet;

    fn supports(&self, language: &str) -> bool {
        supports_language(language)
    }

    fn execute(&self, tree: &SyntaxTree, context: &PluginContext, options: &Value) -> anyhow::Result<FactSet> {
        let resolve = options.get("resolve").and_then(Value::as_bool).unwrap_or(true);
        let file_path = context.file_path.as_path();

        let mut dependencies = match route("dependencies", tree, context)? {
            Route::Grammar(analyzer) => {
                let config = config_for(&context.language);
                analyzer
                    .dependencies(tree)
                    .into_iter()
                    .map(|raw| {
                        let is_local = config.is_some_and(|c| c.is_local(&raw.source, raw.kind));
                        let resolved_path = match config {
                            Some(c) if is_local && resolve => c.resolve(file_path, &raw.source, raw.kind),
                            _ => None,
                        };
                        DependencyInfo {
                            source: raw.source,
                            kind: raw.kind,
                            is_local,
                            line: raw.line,
                            resolved_path,
                        }
                    })
                    .collect()
            }
            Route::Patterns(config) => {
                fallback::dependencies_of(&Scan::new(config, tree.source()), file_path)
            }
        };

        if !resolve {
            for dep in &mut dependencies {
                dep.resolved_path = None;
            }
        }
        Ok(FactSet::Dependencies(dependencies))
    }

    fn validate(&self, output: &FactSet) -> bool {
        output.as_dependencies().is_some_and(|deps| {
            deps.iter().all(|d| {
                d.line > 0
                    && d.resolved_path
                        .as_deref()
                        .map_or(true, |p| d.is_local && Path::new(p).exists())
            })
        })
    }
}

/// Exported symbols: processor chain, re-export supplementation,
/// deduplication and class aggregation.
pub struct ExportExtractor;

impl Plugin for ExportExtractor {
    type Input = SyntaxTree;
    type Output = FactSet;

    fn supports(&self, language: &str) -> bool {
        supports_language(language)
    }

    fn execute(&self, tree: &SyntaxTree, context: &PluginContext, _options: &Value) -> anyhow::Result<FactSet> {
        let facts = match route("exports", tree, context)? {
            Route::Grammar(analyzer) => {
                let mut exports = analyzer.exports(tree);
                if let Some(config) = config_for(&context.language).filter(|c| c.reexports) {
                    let spans = comments::find_comments(tree.source(), &config.comment_pattern);
                    let masked = comments::mask(tree.source(), &spans);
                    let anchors = reexport_anchors(tree);
                    supplement_reexports(&masked, tree.lines(), Some(&anchors), &mut exports);
                }
                finalize(exports)
            }
            Route::Patterns(config) => fallback::exports_of(&Scan::new(config, tree.source())),
        };
        Ok(FactSet::Exports(facts))
    }

    fn validate(&self, output: &FactSet) -> bool {
        let Some(facts) = output.as_exports() else {
            return false;
        };
        let mut seen = HashSet::new();
        facts.exports.iter().all(|e| seen.insert(e.dedup_key()))
    }
}

/// Every function and method with cyclomatic complexity.
pub struct FunctionExtractor;

impl Plugin for FunctionExtractor {
    type Input = SyntaxTree;
    type Output = FactSet;

    fn supports(&self, language: &str) -> bool {
        supports_language(language)
    }

    fn execute(&self, tree: &SyntaxTree, context: &PluginContext, _options: &Value) -> anyhow::Result<FactSet> {
        let functions = match route("functions", tree, context)? {
            Route::Grammar(analyzer) => analyzer.functions(tree)?,
            Route::Patterns(config) => {
                let scan = Scan::new(config, tree.source());
                let exported = exported_names(&scan);
                let classes = fallback::classes_of(&scan, &exported);
                fallback::functions_of(&scan, &exported, &classes)
            }
        };
        Ok(FactSet::Functions(functions))
    }

    fn validate(&self, output: &FactSet) -> bool {
        output
            .as_functions()
            .is_some_and(|functions| functions.iter().all(|f| f.complexity >= 1))
    }
}

/// Classes, interfaces, structs, enums and traits.
pub struct ClassExtractor;

impl Plugin for ClassExtractor {
    type Input = SyntaxTree;
    type Output = FactSet;

    fn supports(&self, language: &str) -> bool {
        supports_language(language)
    }

    fn execute(&self, tree: &SyntaxTree, context: &PluginContext, _options: &Value) -> anyhow::Result<FactSet> {
        let classes = match route("classes", tree, context)? {
            Route::Grammar(analyzer) => analyzer.classes(tree),
            Route::Patterns(config) => {
                let scan = Scan::new(config, tree.source());
                let exported = exported_names(&scan);
                fallback::classes_of(&scan, &exported)
                    .into_iter()
                    .map(|(class, _)| class)
                    .collect()
            }
        };
        Ok(FactSet::Classes(classes))
    }
}

/// Distinct identifiers with occurrence counts.
pub struct IdentifierExtractor;

impl Plugin for IdentifierExtractor {
    type Input = SyntaxTree;
    type Output = FactSet;

    fn supports(&self, language: &str) -> bool {
        supports_language(language)
    }

    fn execute(&self, tree: &SyntaxTree, context: &PluginContext, _options: &Value) -> anyhow::Result<FactSet> {
        let identifiers = match route("identifiers", tree, context)? {
            Route::Grammar(analyzer) => analyzer.identifiers(tree),
            Route::Patterns(config) => fallback::identifiers_of(&Scan::new(config, tree.source())),
        };
        Ok(FactSet::Identifiers(identifiers))
    }
}

/// Comments with TODO markers and doc annotations.
pub struct CommentExtractor;

impl Plugin for CommentExtractor {
    type Input = SyntaxTree;
    type Output = FactSet;

    fn supports(&self, language: &str) -> bool {
        supports_language(language)
    }

    fn execute(&self, tree: &SyntaxTree, context: &PluginContext, _options: &Value) -> anyhow::Result<FactSet> {
        let facts = match route("comments", tree, context)? {
            Route::Grammar(analyzer) => {
                let found = analyzer.comments(tree);
                let (todos, annotations) = comments::mine(&found, tree.source());
                crate::analysis::CommentFacts {
                    comments: found,
                    todos,
                    annotations,
                }
            }
            Route::Patterns(config) => fallback::comments_of(&Scan::new(config, tree.source())),
        };
        Ok(FactSet::Comments(facts))
    }
}

fn exported_names(scan: &Scan) -> HashSet<String> {
    fallback::exports_of(scan)
        .exports
        .into_iter()
        .map(|e| e.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{DependencyKind, ExportType};
    use crate::parser::ParserRegistry;
    use std::fs;
    use tempfile::TempDir;

    fn parse(path: &Path, source: &str) -> (SyntaxTree, PluginContext) {
        let registry = ParserRegistry::with_builtin();
        let provider = registry.detect_and_get_parser(path, Some(source)).unwrap();
        let result = provider.parse(source, path);
        let context = PluginContext::new(path, result.language());
        (result.ast().unwrap().clone(), context)
    }

    #[test]
    fn test_import_scenario() {
        let (tree, ctx) = parse(
            Path::new("src/app.ts"),
            "import { A, B as C } from './x';\nexport { A };\n",
        );

        let deps = DependencyExtractor.execute(&tree, &ctx, &Value::Null).unwrap();
        let deps = deps.as_dependencies().unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].source, "./x");
        assert!(deps[0].is_local);
        assert_eq!(deps[0].resolved_path, None);

        let exports = ExportExtractor.execute(&tree, &ctx, &Value::Null).unwrap();
        let names: Vec<_> = exports
            .as_exports()
            .unwrap()
            .exports
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["A"]);
    }

    #[test]
    fn test_default_class_exported_once() {
        let (tree, ctx) = parse(Path::new("foo.ts"), "export default class Foo {}\n");
        let facts = ExportExtractor.execute(&tree, &ctx, &Value::Null).unwrap();
        let facts = facts.as_exports().unwrap();
        let foo: Vec<_> = facts.exports.iter().filter(|e| e.name == "Foo").collect();
        assert_eq!(foo.len(), 1);
        assert!(foo[0].is_default);
        assert_eq!(facts.default_export.as_deref(), Some("Foo"));
    }

    #[test]
    fn test_reexports_supplemented_on_grammar_path() {
        let source = "export * from './all';\nexport { a, b as c } from './parts';\n// export { hidden } from './nope';\n";
        let (tree, ctx) = parse(Path::new("index.ts"), source);
        let facts = ExportExtractor.execute(&tree, &ctx, &Value::Null).unwrap();
        let names: Vec<_> = facts
            .as_exports()
            .unwrap()
            .exports
            .iter()
            .filter(|e| e.export_type == ExportType::ReExport)
            .map(|e| e.name.clone())
            .collect();
        assert!(names.contains(&"* from ./all".to_string()));
        assert!(names.contains(&"a".to_string()));
        assert!(names.contains(&"c".to_string()));
        assert!(!names.contains(&"hidden".to_string()));
    }

    #[test]
    fn test_reexport_text_inside_string_is_ignored() {
        let source = "const s = `\nexport { fake } from './nope';\n`;\nexport const real = 1;\n";
        let (tree, ctx) = parse(Path::new("a.ts"), source);
        let facts = ExportExtractor.execute(&tree, &ctx, &Value::Null).unwrap();
        let names: Vec<_> = facts
            .as_exports()
            .unwrap()
            .exports
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["real"]);
    }

    #[test]
    fn test_default_export_of_declared_class() {
        let (tree, ctx) = parse(Path::new("foo.ts"), "export class Foo {}\nexport default Foo;\n");
        let facts = ExportExtractor.execute(&tree, &ctx, &Value::Null).unwrap();
        let facts = facts.as_exports().unwrap();
        let foo: Vec<_> = facts.exports.iter().filter(|e| e.name == "Foo").collect();
        assert_eq!(foo.len(), 1);
        assert!(foo[0].is_default);
        assert_eq!(facts.default_export.as_deref(), Some("Foo"));
    }

    #[test]
    fn test_local_import_resolves_js_to_ts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("util.ts"), "export const x = 1;\n").unwrap();
        let file = dir.path().join("main.ts");
        let (tree, ctx) = parse(&file, "import { x } from './util.js';\nimport y from './missing';\n");

        let facts = DependencyExtractor.execute(&tree, &ctx, &Value::Null).unwrap();
        let deps = facts.as_dependencies().unwrap();
        assert_eq!(deps.len(), 2);
        let resolved = deps[0].resolved_path.as_deref().unwrap();
        assert!(resolved.ends_with("util.ts"));
        assert!(deps[1].is_local);
        assert_eq!(deps[1].resolved_path, None);
        assert!(DependencyExtractor.validate(&facts));

        let unresolved = DependencyExtractor
            .execute(&tree, &ctx, &serde_json::json!({"resolve": false}))
            .unwrap();
        assert!(unresolved.as_dependencies().unwrap()[0].resolved_path.is_none());
    }

    #[test]
    fn test_ruby_uses_pattern_tables() {
        let source = "require 'json'\nrequire_relative 'lib/helper'\n\nclass Greeter\n  def greet(name)\n    puts name # TODO: localize\n  end\nend\n";
        let (tree, ctx) = parse(Path::new("app.rb"), source);
        assert!(tree.is_pattern_only());

        let deps = DependencyExtractor.execute(&tree, &ctx, &Value::Null).unwrap();
        let deps = deps.as_dependencies().unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].source, "json");
        assert!(!deps[0].is_local);
        assert_eq!(deps[1].source, "lib/helper");
        assert!(deps[1].is_local);
        assert_eq!(deps[1].kind, DependencyKind::Require);

        let functions = FunctionExtractor.execute(&tree, &ctx, &Value::Null).unwrap();
        let greet = &functions.as_functions().unwrap()[0];
        assert_eq!(greet.name, "greet");
        assert_eq!(greet.parent.as_deref(), Some("Greeter"));
        assert_eq!(greet.complexity, 1);

        let comments = CommentExtractor.execute(&tree, &ctx, &Value::Null).unwrap();
        assert_eq!(comments.as_comments().unwrap().todos.len(), 1);
    }

    #[test]
    fn test_python_functions_and_comments() {
        let source = "def check(x):\n    # NOTE: hot path\n    if x > 1 and x < 5:\n        return True\n    return False\n";
        let (tree, ctx) = parse(Path::new("check.py"), source);

        let functions = FunctionExtractor.execute(&tree, &ctx, &Value::Null).unwrap();
        let check = &functions.as_functions().unwrap()[0];
        assert_eq!(check.name, "check");
        assert!(check.complexity >= 2);

        let comments = CommentExtractor.execute(&tree, &ctx, &Value::Null).unwrap();
        let todos = &comments.as_comments().unwrap().todos;
        assert_eq!(todos[0].marker, "NOTE");
        assert_eq!(todos[0].line, 2);
    }

    #[test]
    fn test_unknown_language_is_an_error() {
        let tree = SyntaxTree::pattern_only(std::sync::Arc::from("x"));
        let ctx = PluginContext::new("a.cobol", "cobol");
        assert!(!DependencyExtractor.supports("cobol"));
        assert!(DependencyExtractor.execute(&tree, &ctx, &Value::Null).is_err());
    }
}
