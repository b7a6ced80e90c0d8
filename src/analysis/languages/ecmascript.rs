//! Walkers shared by the TypeScript and JavaScript analyzers.
//!
//! Both grammars agree on the node kinds used here; TypeScript-only forms
//! (interfaces, type aliases, enums, accessibility modifiers) simply never
//! appear in JavaScript trees.

use tree_sitter::Node;

use crate::analysis::exports::{run_chain, ExportContext, ExportProcessor};
use crate::analysis::{
    ancestor, has_child, parameter_names, unquote, walk, ClassInfo, ClassKind, DependencyKind,
    ExportMethodInfo, ExportType, FunctionSite, RawDependency,
};
use crate::parser::SyntaxTree;

const FUNCTION_DECLARATIONS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_signature",
];

const CLASS_DECLARATIONS: &[&str] = &["class_declaration", "abstract_class_declaration"];

const FUNCTION_VALUES: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "property_identifier",
    "private_property_identifier",
    "shorthand_property_identifier",
    "type_identifier",
];

pub(super) fn identifier_kinds() -> &'static [&'static str] {
    IDENTIFIER_KINDS
}

/// Imports, `export ... from`, `require(...)` and dynamic `import(...)`.
pub(super) fn dependencies(tree: &SyntaxTree) -> Vec<RawDependency> {
    let Some(root) = tree.root() else {
        return Vec::new();
    };

    let mut deps = Vec::new();
    walk(root, |node| {
        let found = match node.kind() {
            "import_statement" | "export_statement" => node
                .child_by_field_name("source")
                .map(|s| (s, DependencyKind::Import)),
            "import_require_clause" => node
                .child_by_field_name("source")
                .map(|s| (s, DependencyKind::Require)),
            "call_expression" => call_dependency(tree, node),
            _ => None,
        };
        if let Some((source, kind)) = found {
            deps.push(RawDependency {
                source: unquote(tree.text(source)),
                kind,
                line: source.start_position().row + 1,
            });
        }
        true
    });
    deps
}

/// `require('x')` or `import('x')` with a literal argument.
fn call_dependency<'t>(tree: &SyntaxTree, call: Node<'t>) -> Option<(Node<'t>, DependencyKind)> {
    let function = call.child_by_field_name("function")?;
    let kind = match function.kind() {
        "import" => DependencyKind::Import,
        "identifier" if tree.text(function) == "require" => DependencyKind::Require,
        _ => return None,
    };
    let arguments = call.child_by_field_name("arguments")?;
    let first = arguments.named_child(0)?;
    (first.kind() == "string").then_some((first, kind))
}

/// Processor chain, in priority order.
pub(super) const CHAIN: &[&dyn ExportProcessor] = &[
    &DefaultExportProcessor,
    &FunctionExportProcessor,
    &ClassExportProcessor,
    &VariableTypeExportProcessor,
    &CommonJsExportProcessor,
    &NamedExportClauseProcessor,
];

pub(super) fn exports(tree: &SyntaxTree) -> Vec<ExportMethodInfo> {
    run_chain(CHAIN, tree)
}

/// Declaration of an export statement, looking through `declare`.
fn declaration_of(export: Node<'_>) -> Option<Node<'_>> {
    let declaration = export.child_by_field_name("declaration")?;
    if declaration.kind() == "ambient_declaration" {
        return declaration.named_child(0);
    }
    Some(declaration)
}

fn is_export_with_declaration(node: Node<'_>, kinds: &[&str]) -> bool {
    node.kind() == "export_statement"
        && declaration_of(node).is_some_and(|d| kinds.contains(&d.kind()))
}

fn return_type(ctx: &ExportContext<'_>, node: Node<'_>) -> Option<String> {
    node.child_by_field_name("return_type").map(|r| {
        ctx.text(r)
            .trim_start_matches(':')
            .trim()
            .to_string()
    })
}

fn function_export(ctx: &ExportContext<'_>, node: Node<'_>, name: &str) -> ExportMethodInfo {
    let mut export = ExportMethodInfo::new(name, ExportType::Function, node.kind(), ctx.location(node));
    export.is_async = Some(has_child(node, "async"));
    export.parameters = node
        .child_by_field_name("parameters")
        .map(|p| parameter_names(ctx.tree(), p));
    export.return_type = return_type(ctx, node);
    export
}

fn visibility(ctx: &ExportContext<'_>, member: Node<'_>, name: &str) -> Option<String> {
    if name.starts_with('#') {
        return Some("private".to_string());
    }
    let mut cursor = member.walk();
    let modifier = member
        .children(&mut cursor)
        .find(|c| c.kind() == "accessibility_modifier")
        .map(|c| ctx.text(c).to_string());
    modifier
}

/// Record a class and its members.
fn class_exports(ctx: &mut ExportContext<'_>, class: Node<'_>, name: &str, is_default: bool) {
    let mut export = ExportMethodInfo::new(name, ExportType::Class, class.kind(), ctx.location(class));
    export.is_default = is_default;
    ctx.push(export);

    let Some(body) = class.child_by_field_name("body") else {
        return;
    };
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        let (export_type, name_node) = match member.kind() {
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                (ExportType::ClassMethod, member.child_by_field_name("name"))
            }
            "public_field_definition" => {
                (ExportType::ClassProperty, member.child_by_field_name("name"))
            }
            "field_definition" => (
                ExportType::ClassProperty,
                member.child_by_field_name("property"),
            ),
            _ => continue,
        };
        let Some(name_node) = name_node else {
            continue;
        };
        let member_name = ctx.text(name_node).to_string();

        let mut export = ExportMethodInfo::new(
            member_name.as_str(),
            export_type,
            member.kind(),
            ctx.location(member),
        )
        .member_of(name);
        export.is_static = Some(has_child(member, "static"));
        export.visibility = visibility(ctx, member, &member_name);
        if export_type == ExportType::ClassMethod {
            export.is_async = Some(has_child(member, "async"));
            export.parameters = member
                .child_by_field_name("parameters")
                .map(|p| parameter_names(ctx.tree(), p));
            export.return_type = return_type(ctx, member);
        }
        ctx.push(export);
    }
}

/// Export type of a top-level declaration named `name`, if any.
fn local_declaration_type(ctx: &ExportContext<'_>, name: &str) -> Option<ExportType> {
    let root = ctx.tree().root()?;
    let mut cursor = root.walk();
    let children: Vec<_> = root.named_children(&mut cursor).collect();

    for child in children {
        let declaration = if child.kind() == "export_statement" {
            match declaration_of(child) {
                Some(d) => d,
                None => continue,
            }
        } else {
            child
        };

        let kind = declaration.kind();
        if matches!(kind, "lexical_declaration" | "variable_declaration") {
            let mut declarators = declaration.walk();
            for declarator in declaration.named_children(&mut declarators) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let matches_name = declarator
                    .child_by_field_name("name")
                    .is_some_and(|n| ctx.text(n) == name);
                if matches_name {
                    let is_function = declarator
                        .child_by_field_name("value")
                        .is_some_and(|v| FUNCTION_VALUES.contains(&v.kind()));
                    return Some(if is_function {
                        ExportType::Function
                    } else {
                        ExportType::Variable
                    });
                }
            }
            continue;
        }

        let declared = declaration
            .child_by_field_name("name")
            .is_some_and(|n| ctx.text(n) == name);
        if !declared {
            continue;
        }
        return match kind {
            k if FUNCTION_DECLARATIONS.contains(&k) => Some(ExportType::Function),
            k if CLASS_DECLARATIONS.contains(&k) => Some(ExportType::Class),
            "interface_declaration" | "type_alias_declaration" => Some(ExportType::Type),
            "enum_declaration" => Some(ExportType::Enum),
            _ => None,
        };
    }

    None
}

/// `export default ...`
struct DefaultExportProcessor;

impl ExportProcessor for DefaultExportProcessor {
    fn name(&self) -> &'static str {
        "default"
    }

    fn can_process(&self, node: Node<'_>, _ctx: &ExportContext<'_>) -> bool {
        node.kind() == "export_statement" && has_child(node, "default")
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let target = declaration_of(node).or_else(|| node.child_by_field_name("value"));
        let Some(target) = target else {
            return;
        };
        let name = target
            .child_by_field_name("name")
            .map(|n| ctx.text(n).to_string());

        match target.kind() {
            k if CLASS_DECLARATIONS.contains(&k) || k == "class" => {
                let name = name.unwrap_or_else(|| "default".to_string());
                class_exports(ctx, target, &name, true);
            }
            k if FUNCTION_DECLARATIONS.contains(&k) || FUNCTION_VALUES.contains(&k) => {
                let name = name.unwrap_or_else(|| "default".to_string());
                let export = function_export(ctx, target, &name).default_export();
                ctx.push(export);
            }
            "identifier" => {
                let name = ctx.text(target).to_string();
                let export_type = local_declaration_type(ctx, &name).unwrap_or(ExportType::Variable);
                let export =
                    ExportMethodInfo::new(name, export_type, "export_default", ctx.location(node))
                        .default_export();
                ctx.push(export);
            }
            _ => {
                let export =
                    ExportMethodInfo::new("default", ExportType::Variable, "export_default", ctx.location(node))
                        .default_export();
                ctx.push(export);
            }
        }
    }
}

/// `export function f() {}`
struct FunctionExportProcessor;

impl ExportProcessor for FunctionExportProcessor {
    fn name(&self) -> &'static str {
        "function"
    }

    fn can_process(&self, node: Node<'_>, _ctx: &ExportContext<'_>) -> bool {
        is_export_with_declaration(node, FUNCTION_DECLARATIONS)
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let Some(declaration) = declaration_of(node) else {
            return;
        };
        let Some(name) = declaration.child_by_field_name("name") else {
            return;
        };
        let export = function_export(ctx, declaration, ctx.text(name));
        ctx.push(export);
    }
}

/// `export class C {}` with its members.
struct ClassExportProcessor;

impl ExportProcessor for ClassExportProcessor {
    fn name(&self) -> &'static str {
        "class"
    }

    fn can_process(&self, node: Node<'_>, _ctx: &ExportContext<'_>) -> bool {
        is_export_with_declaration(node, CLASS_DECLARATIONS)
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let Some(declaration) = declaration_of(node) else {
            return;
        };
        let Some(name) = declaration.child_by_field_name("name") else {
            return;
        };
        let name = ctx.text(name).to_string();
        class_exports(ctx, declaration, &name, false);
    }
}

/// `export const`, `export let`, interfaces, type aliases and enums.
struct VariableTypeExportProcessor;

impl ExportProcessor for VariableTypeExportProcessor {
    fn name(&self) -> &'static str {
        "variable_type"
    }

    fn can_process(&self, node: Node<'_>, _ctx: &ExportContext<'_>) -> bool {
        is_export_with_declaration(
            node,
            &[
                "lexical_declaration",
                "variable_declaration",
                "interface_declaration",
                "type_alias_declaration",
                "enum_declaration",
            ],
        )
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let Some(declaration) = declaration_of(node) else {
            return;
        };

        match declaration.kind() {
            "interface_declaration" | "type_alias_declaration" | "enum_declaration" => {
                let Some(name) = declaration.child_by_field_name("name") else {
                    return;
                };
                let export_type = if declaration.kind() == "enum_declaration" {
                    ExportType::Enum
                } else {
                    ExportType::Type
                };
                let export = ExportMethodInfo::new(
                    ctx.text(name),
                    export_type,
                    declaration.kind(),
                    ctx.location(declaration),
                );
                ctx.push(export);
            }
            _ => {
                let keyword = declaration
                    .child(0)
                    .map(|k| ctx.text(k).to_string())
                    .unwrap_or_else(|| "var".to_string());
                let mut cursor = declaration.walk();
                let declarators: Vec<_> = declaration
                    .named_children(&mut cursor)
                    .filter(|d| d.kind() == "variable_declarator")
                    .collect();

                for declarator in declarators {
                    let Some(pattern) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    let value = declarator
                        .child_by_field_name("value")
                        .filter(|v| FUNCTION_VALUES.contains(&v.kind()));

                    for binding in bound_names(ctx.tree(), pattern) {
                        let export = match value {
                            Some(function) if pattern.kind() == "identifier" => {
                                let mut export = function_export(ctx, function, &binding);
                                export.declaration_type = keyword.clone();
                                export.location = ctx.location(declarator);
                                export
                            }
                            _ => ExportMethodInfo::new(
                                binding,
                                ExportType::Variable,
                                keyword.as_str(),
                                ctx.location(declarator),
                            ),
                        };
                        ctx.push(export);
                    }
                }
            }
        }
    }
}

/// Names bound by a declarator pattern (`a`, `{ a, b: c }`, `[a, b]`).
fn bound_names(tree: &SyntaxTree, pattern: Node<'_>) -> Vec<String> {
    if pattern.kind() == "identifier" {
        return vec![tree.text(pattern).to_string()];
    }
    let mut names = Vec::new();
    walk(pattern, |node| {
        match node.kind() {
            "shorthand_property_identifier_pattern" | "identifier" => {
                names.push(tree.text(node).to_string());
                false
            }
            // the key of `{ key: binding }` is not bound
            "pair_pattern" => {
                if let Some(value) = node.child_by_field_name("value") {
                    names.extend(bound_names(tree, value));
                }
                false
            }
            _ => true,
        }
    });
    names
}

/// `module.exports = ...`, `exports.x = ...` and `module.exports.x = ...`.
struct CommonJsExportProcessor;

fn commonjs_assignment<'t>(node: Node<'t>, ctx: &ExportContext<'_>) -> Option<(String, Node<'t>)> {
    if node.kind() != "expression_statement" {
        return None;
    }
    let assignment = node.named_child(0)?;
    if assignment.kind() != "assignment_expression" {
        return None;
    }
    let target = ctx.text(assignment.child_by_field_name("left")?);
    let is_commonjs = target == "module.exports"
        || target.starts_with("exports.")
        || target.starts_with("module.exports.");
    if !is_commonjs {
        return None;
    }
    Some((target.to_string(), assignment.child_by_field_name("right")?))
}

impl ExportProcessor for CommonJsExportProcessor {
    fn name(&self) -> &'static str {
        "commonjs"
    }

    fn can_process(&self, node: Node<'_>, ctx: &ExportContext<'_>) -> bool {
        commonjs_assignment(node, ctx).is_some()
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let Some((target, value)) = commonjs_assignment(node, ctx) else {
            return;
        };

        if target != "module.exports" {
            let name = target.rsplit('.').next().unwrap_or(&target).to_string();
            let export = self.value_export(ctx, value, &name, "exports");
            ctx.push(export);
            return;
        }

        match value.kind() {
            "object" => {
                let mut cursor = value.walk();
                let entries: Vec<_> = value.named_children(&mut cursor).collect();
                for entry in entries {
                    let export = match entry.kind() {
                        "pair" => {
                            let (Some(key), Some(v)) = (
                                entry.child_by_field_name("key"),
                                entry.child_by_field_name("value"),
                            ) else {
                                continue;
                            };
                            let name = unquote(ctx.text(key));
                            self.value_export(ctx, v, &name, "module.exports")
                        }
                        "shorthand_property_identifier" => {
                            let name = ctx.text(entry).to_string();
                            let export_type =
                                local_declaration_type(ctx, &name).unwrap_or(ExportType::Variable);
                            ExportMethodInfo::new(name, export_type, "module.exports", ctx.location(entry))
                        }
                        "method_definition" => {
                            let Some(name) = entry.child_by_field_name("name") else {
                                continue;
                            };
                            let mut export = function_export(ctx, entry, ctx.text(name));
                            export.declaration_type = "module.exports".to_string();
                            export
                        }
                        _ => continue,
                    };
                    ctx.push(export);
                }
            }
            "class" => {
                let name = value
                    .child_by_field_name("name")
                    .map(|n| ctx.text(n).to_string())
                    .unwrap_or_else(|| "default".to_string());
                class_exports(ctx, value, &name, true);
            }
            _ => {
                let name = match value.kind() {
                    "identifier" => ctx.text(value).to_string(),
                    _ => value
                        .child_by_field_name("name")
                        .map(|n| ctx.text(n).to_string())
                        .unwrap_or_else(|| "default".to_string()),
                };
                let export = self
                    .value_export(ctx, value, &name, "module.exports")
                    .default_export();
                ctx.push(export);
            }
        }
    }
}

impl CommonJsExportProcessor {
    fn value_export(
        &self,
        ctx: &ExportContext<'_>,
        value: Node<'_>,
        name: &str,
        declaration_type: &str,
    ) -> ExportMethodInfo {
        let mut export = if FUNCTION_VALUES.contains(&value.kind()) {
            function_export(ctx, value, name)
        } else {
            let export_type = match value.kind() {
                "identifier" => local_declaration_type(ctx, ctx.text(value)),
                "class" => Some(ExportType::Class),
                _ => None,
            }
            .unwrap_or(ExportType::Variable);
            ExportMethodInfo::new(name, export_type, declaration_type, ctx.location(value))
        };
        export.declaration_type = declaration_type.to_string();
        export.location = ctx.location(value);
        export
    }
}

/// `export { a, b as c }` without a `from` clause.
struct NamedExportClauseProcessor;

impl ExportProcessor for NamedExportClauseProcessor {
    fn name(&self) -> &'static str {
        "named_clause"
    }

    fn can_process(&self, node: Node<'_>, _ctx: &ExportContext<'_>) -> bool {
        node.kind() == "export_statement"
            && node.child_by_field_name("source").is_none()
            && has_child(node, "export_clause")
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let mut cursor = node.walk();
        let Some(clause) = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "export_clause")
        else {
            return;
        };

        let mut specifiers = clause.walk();
        let specifiers: Vec<_> = clause
            .named_children(&mut specifiers)
            .filter(|s| s.kind() == "export_specifier")
            .collect();

        for specifier in specifiers {
            let Some(local) = specifier.child_by_field_name("name") else {
                continue;
            };
            let local = ctx.text(local).to_string();
            let alias = specifier
                .child_by_field_name("alias")
                .map(|a| ctx.text(a).to_string());
            let export_type = local_declaration_type(ctx, &local).unwrap_or(ExportType::Variable);

            let export = match alias.as_deref() {
                Some("default") => {
                    ExportMethodInfo::new(local, export_type, "export_clause", ctx.location(specifier))
                        .default_export()
                }
                Some(alias) => {
                    ExportMethodInfo::new(alias, export_type, "export_clause", ctx.location(specifier))
                }
                None => {
                    ExportMethodInfo::new(local, export_type, "export_clause", ctx.location(specifier))
                }
            };
            ctx.push(export);
        }
    }
}

/// Named functions, methods and function-valued variables.
pub(super) fn function_sites(tree: &SyntaxTree) -> Vec<FunctionSite<'_>> {
    let Some(root) = tree.root() else {
        return Vec::new();
    };

    let mut sites = Vec::new();
    walk(root, |node| {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    sites.push(FunctionSite::new(node, tree.text(name), None));
                }
            }
            "method_definition" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let parent = enclosing_class(tree, node);
                    sites.push(FunctionSite::new(node, tree.text(name), parent));
                }
            }
            "variable_declarator" | "public_field_definition" | "field_definition" => {
                let name = node
                    .child_by_field_name("name")
                    .or_else(|| node.child_by_field_name("property"));
                let value = node
                    .child_by_field_name("value")
                    .filter(|v| FUNCTION_VALUES.contains(&v.kind()));
                if let (Some(name), Some(value)) = (name, value) {
                    let parent = if node.kind() == "variable_declarator" {
                        None
                    } else {
                        enclosing_class(tree, node)
                    };
                    sites.push(FunctionSite::new(value, tree.text(name), parent));
                }
            }
            _ => {}
        }
        true
    });
    sites
}

fn enclosing_class(tree: &SyntaxTree, node: Node<'_>) -> Option<String> {
    let class = ancestor(node, &["class_declaration", "abstract_class_declaration", "class", "object"])?;
    if class.kind() == "object" {
        return None;
    }
    Some(
        class
            .child_by_field_name("name")
            .map(|n| tree.text(n).to_string())
            .unwrap_or_else(|| "default".to_string()),
    )
}

/// Classes, interfaces and enums anywhere in the tree.
pub(super) fn classes(tree: &SyntaxTree, exported: &[ExportMethodInfo]) -> Vec<ClassInfo> {
    let Some(root) = tree.root() else {
        return Vec::new();
    };

    let mut classes = Vec::new();
    walk(root, |node| {
        let kind = match node.kind() {
            "class_declaration" | "abstract_class_declaration" | "class" => ClassKind::Class,
            "interface_declaration" => ClassKind::Interface,
            "enum_declaration" => ClassKind::Enum,
            _ => return true,
        };
        let Some(name) = node.child_by_field_name("name") else {
            return true;
        };

        let mut class = ClassInfo::new(tree.text(name), kind, tree.location_of(node));
        class.heritage = heritage(tree, node);
        if let Some(body) = node.child_by_field_name("body") {
            collect_members(tree, body, &mut class);
        }
        class.is_exported = exported
            .iter()
            .any(|e| e.parent_class.is_none() && e.name == class.name);
        classes.push(class);
        true
    });
    classes
}

fn heritage(tree: &SyntaxTree, node: Node<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "class_heritage" => {
                let mut clauses = child.walk();
                for clause in child.named_children(&mut clauses) {
                    match clause.kind() {
                        "extends_clause" | "implements_clause" => {
                            let mut types = clause.walk();
                            names.extend(
                                clause
                                    .named_children(&mut types)
                                    .filter(|t| t.kind() != "type_arguments")
                                    .map(|t| tree.text(t).to_string()),
                            );
                        }
                        _ => names.push(tree.text(clause).to_string()),
                    }
                }
            }
            "extends_type_clause" => {
                let mut types = child.walk();
                names.extend(
                    child
                        .named_children(&mut types)
                        .map(|t| tree.text(t).to_string()),
                );
            }
            _ => {}
        }
    }
    names
}

fn collect_members(tree: &SyntaxTree, body: Node<'_>, class: &mut ClassInfo) {
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                if let Some(name) = member.child_by_field_name("name") {
                    class.methods.push(tree.text(name).to_string());
                }
            }
            "public_field_definition" | "property_signature" | "enum_assignment" => {
                if let Some(name) = member.child_by_field_name("name") {
                    class.properties.push(tree.text(name).to_string());
                }
            }
            "field_definition" => {
                if let Some(name) = member.child_by_field_name("property") {
                    class.properties.push(tree.text(name).to_string());
                }
            }
            "property_identifier" => class.properties.push(tree.text(member).to_string()),
            _ => {}
        }
    }
}
