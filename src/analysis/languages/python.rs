//! Python language analyzer using tree-sitter.
//!
//! Public names follow the usual convention: anything not starting with an
//! underscore, narrowed to `__all__` when the module declares it.

use std::collections::HashSet;

use streaming_iterator::StreamingIterator;
use tracing::warn;
use tree_sitter::{Node, QueryCursor};

use crate::analysis::exports::{run_chain, ExportContext, ExportProcessor};
use crate::analysis::{
    collect_comments, field_text, has_child, measure_functions, parameter_names, unquote, walk,
    ClassInfo, ClassKind, CommentInfo, DependencyKind, ExportMethodInfo, ExportType, FunctionInfo,
    FunctionSite, LanguageAnalyzer, LazyQuery, RawDependency,
};
use crate::parser::languages::python::COMPLEXITY_QUERY;
use crate::parser::SyntaxTree;
use crate::patterns::comments;

/// Tree-sitter query for extracting imports.
const IMPORT_QUERY: &str = r#"
; import module, import module as alias
(import_statement
  name: [
    (dotted_name) @module
    (aliased_import name: (dotted_name) @module)
  ]
)

; from module import name, from . import name
(import_from_statement
  module_name: [
    (dotted_name) @module
    (relative_import) @module
  ]
)
"#;

pub struct PythonAnalyzer {
    complexity: LazyQuery,
    imports: LazyQuery,
}

impl PythonAnalyzer {
    pub fn new() -> Self {
        Self {
            complexity: LazyQuery::new(tree_sitter_python::LANGUAGE.into(), COMPLEXITY_QUERY),
            imports: LazyQuery::new(tree_sitter_python::LANGUAGE.into(), IMPORT_QUERY),
        }
    }

    fn extract_imports(&self, tree: &SyntaxTree) -> anyhow::Result<Vec<RawDependency>> {
        let Some(root) = tree.root() else {
            return Ok(Vec::new());
        };
        let query = self.imports.get()?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, root, tree.source().as_bytes());

        let mut imports = Vec::new();
        while let Some(m) = matches.next() {
            for capture in m.captures {
                imports.push((
                    capture.node.start_byte(),
                    RawDependency {
                        source: tree.text(capture.node).to_string(),
                        kind: DependencyKind::Import,
                        line: capture.node.start_position().row + 1,
                    },
                ));
            }
        }

        imports.sort_by_key(|(offset, _)| *offset);
        Ok(imports.into_iter().map(|(_, d)| d).collect())
    }

    /// Names listed in a module-level `__all__`, if declared.
    fn declared_all<'a>(&self, tree: &'a SyntaxTree) -> Option<(Vec<String>, Node<'a>)> {
        let root = tree.root()?;
        let mut cursor = root.walk();
        let statements: Vec<_> = root.named_children(&mut cursor).collect();

        statements.into_iter().find_map(|statement| {
            let assignment = assignment_of(statement)?;
            let left = assignment.child_by_field_name("left")?;
            if tree.text(left) != "__all__" {
                return None;
            }
            let right = assignment.child_by_field_name("right")?;
            if !matches!(right.kind(), "list" | "tuple") {
                return None;
            }
            let mut items = right.walk();
            let names = right
                .named_children(&mut items)
                .filter(|item| item.kind() == "string")
                .map(|item| unquote(tree.text(item)))
                .collect();
            Some((names, statement))
        })
    }

    /// Module, class and function docstrings.
    fn docstrings(&self, tree: &SyntaxTree) -> Vec<CommentInfo> {
        let Some(root) = tree.root() else {
            return Vec::new();
        };
        let mut found = Vec::new();
        let mut push_first = |body: Node<'_>| {
            if let Some(first) = body.named_child(0) {
                if first.kind() == "expression_statement" {
                    if let Some(string) = first.named_child(0).filter(|s| s.kind() == "string") {
                        found.push(comments::comment_at(
                            tree.text(string),
                            string.start_byte(),
                            tree.lines(),
                        ));
                    }
                }
            }
        };

        push_first(root);
        walk(root, |node| {
            if matches!(node.kind(), "class_definition" | "function_definition") {
                if let Some(body) = node.child_by_field_name("body") {
                    push_first(body);
                }
            }
            true
        });
        found
    }
}

impl Default for PythonAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// The assignment of an `x = ...` statement.
fn assignment_of(statement: Node<'_>) -> Option<Node<'_>> {
    if statement.kind() != "expression_statement" {
        return None;
    }
    statement
        .named_child(0)
        .filter(|child| child.kind() == "assignment")
}

/// The definition wrapped by decorators, or the node itself.
fn definition_of(node: Node<'_>) -> Node<'_> {
    if node.kind() == "decorated_definition" {
        if let Some(definition) = node.child_by_field_name("definition") {
            return definition;
        }
    }
    node
}

fn is_public(name: &str) -> bool {
    !name.starts_with('_')
}

/// Visibility implied by naming convention.
fn visibility(name: &str) -> &'static str {
    if name.starts_with("__") && name.ends_with("__") {
        "public"
    } else if name.starts_with("__") {
        "private"
    } else if name.starts_with('_') {
        "protected"
    } else {
        "public"
    }
}

fn decorated_with(node: Node<'_>, tree: &SyntaxTree, decorator: &str) -> bool {
    if node.kind() != "decorated_definition" {
        return false;
    }
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() == "decorator")
        .any(|c| tree.text(c).trim_start_matches('@').trim() == decorator);
    found
}

fn function_export(ctx: &ExportContext<'_>, wrapper: Node<'_>, function: Node<'_>, name: &str) -> ExportMethodInfo {
    let mut export = ExportMethodInfo::new(name, ExportType::Function, function.kind(), ctx.location(wrapper));
    export.is_async = Some(has_child(function, "async"));
    export.parameters = function
        .child_by_field_name("parameters")
        .map(|p| parameter_names(ctx.tree(), p));
    export.return_type = field_text(ctx.tree(), function, "return_type").map(str::to_string);
    export
}

/// Top-level `def`.
struct FunctionProcessor;

impl ExportProcessor for FunctionProcessor {
    fn name(&self) -> &'static str {
        "function"
    }

    fn can_process(&self, node: Node<'_>, ctx: &ExportContext<'_>) -> bool {
        let definition = definition_of(node);
        definition.kind() == "function_definition"
            && field_text(ctx.tree(), definition, "name").is_some_and(is_public)
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let definition = definition_of(node);
        let Some(name) = field_text(ctx.tree(), definition, "name") else {
            return;
        };
        let export = function_export(ctx, node, definition, name);
        ctx.push(export);
    }
}

/// Top-level `class` with its methods and class attributes.
struct ClassProcessor;

impl ExportProcessor for ClassProcessor {
    fn name(&self) -> &'static str {
        "class"
    }

    fn can_process(&self, node: Node<'_>, ctx: &ExportContext<'_>) -> bool {
        let definition = definition_of(node);
        definition.kind() == "class_definition"
            && field_text(ctx.tree(), definition, "name").is_some_and(is_public)
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let class = definition_of(node);
        let Some(class_name) = field_text(ctx.tree(), class, "name") else {
            return;
        };
        let class_export = ExportMethodInfo::new(class_name, ExportType::Class, class.kind(), ctx.location(node));
        ctx.push(class_export);

        let Some(body) = class.child_by_field_name("body") else {
            return;
        };
        let mut cursor = body.walk();
        let members: Vec<_> = body.named_children(&mut cursor).collect();

        for member in members {
            let definition = definition_of(member);
            if definition.kind() == "function_definition" {
                let Some(name) = field_text(ctx.tree(), definition, "name") else {
                    continue;
                };
                let mut export = function_export(ctx, member, definition, name).member_of(class_name);
                export.export_type = ExportType::ClassMethod;
                export.is_static = Some(decorated_with(member, ctx.tree(), "staticmethod"));
                export.visibility = Some(visibility(name).to_string());
                ctx.push(export);
            } else if let Some(assignment) = assignment_of(member) {
                let Some(left) = assignment.child_by_field_name("left") else {
                    continue;
                };
                if left.kind() != "identifier" {
                    continue;
                }
                let name = ctx.text(left);
                let mut export =
                    ExportMethodInfo::new(name, ExportType::ClassProperty, "assignment", ctx.location(member))
                        .member_of(class_name);
                export.is_static = Some(true);
                export.visibility = Some(visibility(name).to_string());
                ctx.push(export);
            }
        }
    }
}

/// Module-level `NAME = value`.
struct AssignmentProcessor;

impl ExportProcessor for AssignmentProcessor {
    fn name(&self) -> &'static str {
        "assignment"
    }

    fn can_process(&self, node: Node<'_>, _ctx: &ExportContext<'_>) -> bool {
        assignment_of(node).is_some()
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let Some(left) = assignment_of(node).and_then(|a| a.child_by_field_name("left")) else {
            return;
        };
        let targets: Vec<_> = if left.kind() == "identifier" {
            vec![left]
        } else {
            let mut cursor = left.walk();
            let names = left
                .named_children(&mut cursor)
                .filter(|n| n.kind() == "identifier")
                .collect();
            names
        };

        for target in targets {
            let name = ctx.text(target);
            if is_public(name) {
                let export = ExportMethodInfo::new(name, ExportType::Variable, "assignment", ctx.location(node));
                ctx.push(export);
            }
        }
    }
}

const CHAIN: &[&dyn ExportProcessor] = &[&FunctionProcessor, &ClassProcessor, &AssignmentProcessor];

impl LanguageAnalyzer for PythonAnalyzer {
    fn language_id(&self) -> &'static str {
        "python"
    }

    fn dependencies(&self, tree: &SyntaxTree) -> Vec<RawDependency> {
        match self.extract_imports(tree) {
            Ok(imports) => imports,
            Err(e) => {
                warn!(error = %e, "python import query failed");
                Vec::new()
            }
        }
    }

    fn exports(&self, tree: &SyntaxTree) -> Vec<ExportMethodInfo> {
        let mut exports = run_chain(CHAIN, tree);

        if let Some((all, statement)) = self.declared_all(tree) {
            let listed: HashSet<&str> = all.iter().map(String::as_str).collect();
            exports.retain(|e| match &e.parent_class {
                Some(parent) => listed.contains(parent.as_str()),
                None => listed.contains(e.name.as_str()),
            });

            // names re-exported from imports appear only in `__all__`
            let declared: HashSet<String> = exports.iter().map(|e| e.name.clone()).collect();
            for name in all.iter().filter(|n| !declared.contains(n.as_str())) {
                exports.push(ExportMethodInfo::new(
                    name.as_str(),
                    ExportType::Variable,
                    "__all__",
                    tree.location_of(statement),
                ));
            }
        }

        exports
    }

    fn functions(&self, tree: &SyntaxTree) -> anyhow::Result<Vec<FunctionInfo>> {
        let Some(root) = tree.root() else {
            return Ok(Vec::new());
        };

        let mut sites = Vec::new();
        walk(root, |node| {
            if node.kind() == "function_definition" {
                if let Some(name) = field_text(tree, node, "name") {
                    sites.push(FunctionSite::new(node, name, enclosing_class(tree, node)));
                }
            }
            true
        });

        measure_functions(tree, sites, &self.complexity, &self.exports(tree))
    }

    fn classes(&self, tree: &SyntaxTree) -> Vec<ClassInfo> {
        let Some(root) = tree.root() else {
            return Vec::new();
        };
        let exports = self.exports(tree);

        let mut classes = Vec::new();
        walk(root, |node| {
            if node.kind() != "class_definition" {
                return true;
            }
            let Some(name) = field_text(tree, node, "name") else {
                return true;
            };

            let mut class = ClassInfo::new(name, ClassKind::Class, tree.location_of(node));
            if let Some(superclasses) = node.child_by_field_name("superclasses") {
                let mut cursor = superclasses.walk();
                class.heritage = superclasses
                    .named_children(&mut cursor)
                    .filter(|s| matches!(s.kind(), "identifier" | "attribute" | "subscript"))
                    .map(|s| tree.text(s).to_string())
                    .collect();
            }
            if let Some(body) = node.child_by_field_name("body") {
                collect_members(tree, body, &mut class);
            }
            class.is_exported = exports
                .iter()
                .any(|e| e.parent_class.is_none() && e.name == class.name);
            classes.push(class);
            true
        });
        classes
    }

    fn identifier_kinds(&self) -> &'static [&'static str] {
        &["identifier"]
    }

    fn comments(&self, tree: &SyntaxTree) -> Vec<CommentInfo> {
        let mut all = collect_comments(tree, self.comment_kinds());
        all.extend(self.docstrings(tree));
        all.sort_by_key(|c| c.line);
        all
    }
}

/// Class whose body directly holds the function.
fn enclosing_class(tree: &SyntaxTree, function: Node<'_>) -> Option<String> {
    let mut holder = function.parent()?;
    if holder.kind() == "decorated_definition" {
        holder = holder.parent()?;
    }
    let class = holder.parent().filter(|p| p.kind() == "class_definition")?;
    field_text(tree, class, "name").map(str::to_string)
}

fn collect_members(tree: &SyntaxTree, body: Node<'_>, class: &mut ClassInfo) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut cursor = body.walk();
    let members: Vec<_> = body.named_children(&mut cursor).collect();

    for member in members {
        let definition = definition_of(member);
        if definition.kind() == "function_definition" {
            let Some(name) = field_text(tree, definition, "name") else {
                continue;
            };
            class.methods.push(name.to_string());
            if name == "__init__" {
                // instance attributes assigned in the constructor
                if let Some(init_body) = definition.child_by_field_name("body") {
                    walk(init_body, |node| {
                        if node.kind() == "assignment" {
                            if let Some(left) = node.child_by_field_name("left") {
                                if left.kind() == "attribute"
                                    && field_text(tree, left, "object") == Some("self")
                                {
                                    if let Some(attr) = field_text(tree, left, "attribute") {
                                        if seen.insert(attr.to_string()) {
                                            class.properties.push(attr.to_string());
                                        }
                                    }
                                }
                            }
                        }
                        true
                    });
                }
            }
        } else if let Some(left) = assignment_of(member).and_then(|a| a.child_by_field_name("left")) {
            if left.kind() == "identifier" && seen.insert(tree.text(left).to_string()) {
                class.properties.push(tree.text(left).to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::analysis::CommentKind;
    use crate::parser::languages::python;
    use crate::parser::SyntaxProvider;

    fn parse(source: &str) -> SyntaxTree {
        python::provider()
            .parse(source, Path::new("test.py"))
            .ast()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_imports() {
        let tree = parse("import os, sys as system\nfrom . import utils\nfrom ..models import User\nfrom typing import List\n");
        let deps = PythonAnalyzer::new().dependencies(&tree);
        let sources: Vec<_> = deps.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(sources, vec!["os", "sys", ".", "..models", "typing"]);
        assert_eq!(deps[3].line, 3);
    }

    #[test]
    fn test_exports_skip_private_names() {
        let tree = parse(
            r#"
VERSION = "1.0"
_cache = {}

def public(a, b=1):
    pass

def _helper():
    pass

class Service(Base):
    retries = 3

    def __init__(self):
        self.client = None

    @staticmethod
    def build():
        pass

    def _reset(self):
        pass
"#,
        );
        let exports = PythonAnalyzer::new().exports(&tree);
        let names: Vec<_> = exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["VERSION", "public", "Service", "retries", "__init__", "build", "_reset"]);

        let public = &exports[1];
        assert_eq!(public.parameters.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));

        let build = exports.iter().find(|e| e.name == "build").unwrap();
        assert_eq!(build.is_static, Some(true));
        assert_eq!(build.parent_class.as_deref(), Some("Service"));

        let reset = exports.iter().find(|e| e.name == "_reset").unwrap();
        assert_eq!(reset.visibility.as_deref(), Some("protected"));
    }

    #[test]
    fn test_dunder_all_narrows_exports() {
        let tree = parse(
            r#"
from .impl import fast_path

__all__ = ["run", "fast_path"]

def run():
    pass

def other():
    pass
"#,
        );
        let exports = PythonAnalyzer::new().exports(&tree);
        let names: Vec<_> = exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["run", "fast_path"]);
        assert_eq!(exports[1].declaration_type, "__all__");
    }

    #[test]
    fn test_functions_and_methods() {
        let tree = parse(
            r#"
def check(x):
    if x and x > 1:
        return [i for i in range(x)]
    return []

class Worker:
    async def run(self):
        def inner():
            pass
        return inner
"#,
        );
        let functions = PythonAnalyzer::new().functions(&tree).unwrap();
        let names: Vec<_> = functions.iter().map(|f| f.qualified_name()).collect();
        assert_eq!(names, vec!["check", "Worker.run", "inner"]);
        // if + and + comprehension
        assert_eq!(functions[0].complexity, 4);
        assert!(functions[1].is_async);
        assert_eq!(functions[1].parameters, vec!["self"]);
        assert!(functions[1].is_exported);
        assert!(!functions[2].is_method());
    }

    #[test]
    fn test_classes() {
        let tree = parse(
            r#"
class Model(Base, metaclass=Meta):
    table = "users"

    def __init__(self, name):
        self.name = name

    def save(self):
        pass
"#,
        );
        let classes = PythonAnalyzer::new().classes(&tree);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].heritage, vec!["Base"]);
        assert_eq!(classes[0].methods, vec!["__init__", "save"]);
        assert_eq!(classes[0].properties, vec!["table", "name"]);
        assert!(classes[0].is_exported);
    }

    #[test]
    fn test_docstrings_are_comments() {
        let tree = parse("\"\"\"Module docs.\"\"\"\n# TODO: more\ndef f():\n    \"\"\"Function docs.\"\"\"\n");
        let comments = PythonAnalyzer::new().comments(&tree);
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[0].kind, CommentKind::Doc);
        assert_eq!(comments[0].text, "Module docs.");
        assert_eq!(comments[1].kind, CommentKind::Line);
        assert_eq!(comments[2].line, 4);
    }
}
