//! Rust language analyzer using tree-sitter.
//!
//! Extracts:
//! - `use` declarations, `extern crate` and out-of-line `mod x;` items
//! - Public items, `pub use` re-exports and public inherent methods
//! - Functions and methods (inside `impl` and `trait` blocks)
//! - Structs, enums, unions and traits, with implemented traits as heritage

use std::collections::HashMap;

use tree_sitter::Node;

use crate::analysis::exports::{run_chain, ExportContext, ExportProcessor};
use crate::analysis::{
    field_text, has_child, measure_functions, parameter_names, walk, ClassInfo, ClassKind,
    DependencyKind, ExportMethodInfo, ExportType, FunctionInfo, FunctionSite, LanguageAnalyzer,
    LazyQuery, RawDependency,
};
use crate::parser::languages::rust_lang::COMPLEXITY_QUERY;
use crate::parser::SyntaxTree;

/// Rust language analyzer.
pub struct RustAnalyzer {
    complexity: LazyQuery,
}

impl RustAnalyzer {
    /// Create a new Rust analyzer.
    pub fn new() -> Self {
        Self {
            complexity: LazyQuery::new(tree_sitter_rust::LANGUAGE.into(), COMPLEXITY_QUERY),
        }
    }
}

impl Default for RustAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether an item is `pub` (restricted forms like `pub(crate)` are not).
fn is_public(tree: &SyntaxTree, item: Node<'_>) -> bool {
    let mut cursor = item.walk();
    let public = item
        .named_children(&mut cursor)
        .any(|c| c.kind() == "visibility_modifier" && tree.text(c) == "pub");
    public
}

fn is_async(item: Node<'_>) -> bool {
    let mut cursor = item.walk();
    let found = item
        .named_children(&mut cursor)
        .any(|c| c.kind() == "function_modifiers" && has_child(c, "async"));
    found
}

/// Base name of a type (`Vec<T>` gives `Vec`, `a::B` gives `B`).
fn type_name<'t>(tree: &'t SyntaxTree, ty: Node<'_>) -> &'t str {
    match ty.kind() {
        "generic_type" | "reference_type" => ty
            .child_by_field_name("type")
            .map(|inner| type_name(tree, inner))
            .unwrap_or_else(|| tree.text(ty)),
        "scoped_type_identifier" => field_text(tree, ty, "name").unwrap_or_else(|| tree.text(ty)),
        _ => tree.text(ty),
    }
}

/// Module path of a `use` argument.
fn use_source(tree: &SyntaxTree, argument: Node<'_>) -> String {
    match argument.kind() {
        "scoped_use_list" | "use_as_clause" => field_text(tree, argument, "path")
            .unwrap_or_else(|| tree.text(argument))
            .to_string(),
        "use_wildcard" => tree.text(argument).trim_end_matches("::*").to_string(),
        _ => tree.text(argument).to_string(),
    }
}

/// Names brought in by a `use` argument, each with its module path.
fn use_bindings(tree: &SyntaxTree, argument: Node<'_>, prefix: &str) -> Vec<(String, String)> {
    let join = |path: &str| -> String {
        match (prefix.is_empty(), path.is_empty()) {
            (true, _) => path.to_string(),
            (false, true) => prefix.to_string(),
            (false, false) => format!("{}::{}", prefix, path),
        }
    };

    match argument.kind() {
        "identifier" => vec![(tree.text(argument).to_string(), prefix.to_string())],
        "scoped_identifier" => {
            let path = field_text(tree, argument, "path").unwrap_or("");
            let name = field_text(tree, argument, "name").unwrap_or("");
            vec![(name.to_string(), join(path))]
        }
        "use_as_clause" => {
            let alias = field_text(tree, argument, "alias").unwrap_or("");
            let path = argument
                .child_by_field_name("path")
                .map(|p| match p.kind() {
                    "scoped_identifier" => field_text(tree, p, "path").unwrap_or(""),
                    _ => "",
                })
                .unwrap_or("");
            vec![(alias.to_string(), join(path))]
        }
        "use_wildcard" => {
            let path = join(tree.text(argument).trim_end_matches("::*").trim_end_matches('*'));
            vec![(format!("* from {}", path), path)]
        }
        "scoped_use_list" => {
            let path = join(field_text(tree, argument, "path").unwrap_or(""));
            let Some(list) = argument.child_by_field_name("list") else {
                return Vec::new();
            };
            let mut cursor = list.walk();
            let items: Vec<_> = list.named_children(&mut cursor).collect();
            items
                .into_iter()
                .flat_map(|item| use_bindings(tree, item, &path))
                .collect()
        }
        "use_list" => {
            let mut cursor = argument.walk();
            let items: Vec<_> = argument.named_children(&mut cursor).collect();
            items
                .into_iter()
                .flat_map(|item| use_bindings(tree, item, prefix))
                .collect()
        }
        _ => Vec::new(),
    }
}

fn function_export(ctx: &ExportContext<'_>, item: Node<'_>, name: &str) -> ExportMethodInfo {
    let mut export = ExportMethodInfo::new(name, ExportType::Function, item.kind(), ctx.location(item));
    export.is_async = Some(is_async(item));
    export.parameters = item
        .child_by_field_name("parameters")
        .map(|p| parameter_names(ctx.tree(), p));
    export.return_type = field_text(ctx.tree(), item, "return_type").map(str::to_string);
    export
}

/// `pub fn`, `pub struct`, `pub enum`, `pub trait`, `pub type`, `pub const`.
struct PublicItemProcessor;

impl ExportProcessor for PublicItemProcessor {
    fn name(&self) -> &'static str {
        "public_item"
    }

    fn can_process(&self, node: Node<'_>, ctx: &ExportContext<'_>) -> bool {
        matches!(
            node.kind(),
            "function_item"
                | "struct_item"
                | "union_item"
                | "enum_item"
                | "trait_item"
                | "type_item"
                | "const_item"
                | "static_item"
        ) && is_public(ctx.tree(), node)
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let tree = ctx.tree();
        let Some(name) = field_text(tree, node, "name") else {
            return;
        };

        let export = match node.kind() {
            "function_item" => function_export(ctx, node, name),
            kind => {
                let export_type = match kind {
                    "struct_item" | "union_item" => ExportType::Class,
                    "enum_item" => ExportType::Enum,
                    "trait_item" | "type_item" => ExportType::Type,
                    _ => ExportType::Variable,
                };
                ExportMethodInfo::new(name, export_type, kind, ctx.location(node))
            }
        };
        ctx.push(export);

        if node.kind() != "struct_item" {
            return;
        }
        let Some(fields) = node.child_by_field_name("body") else {
            return;
        };
        let mut cursor = fields.walk();
        let declarations: Vec<_> = fields
            .named_children(&mut cursor)
            .filter(|f| f.kind() == "field_declaration" && is_public(tree, *f))
            .collect();
        for field in declarations {
            let Some(field_name) = field_text(tree, field, "name") else {
                continue;
            };
            let mut export = ExportMethodInfo::new(
                field_name,
                ExportType::ClassProperty,
                "field_declaration",
                ctx.location(field),
            )
            .member_of(name);
            export.is_static = Some(false);
            export.visibility = Some("public".to_string());
            ctx.push(export);
        }
    }
}

/// `pub use path::{A, B as C}` re-exports.
struct PublicUseProcessor;

impl ExportProcessor for PublicUseProcessor {
    fn name(&self) -> &'static str {
        "public_use"
    }

    fn can_process(&self, node: Node<'_>, ctx: &ExportContext<'_>) -> bool {
        node.kind() == "use_declaration" && is_public(ctx.tree(), node)
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let Some(argument) = node.child_by_field_name("argument") else {
            return;
        };
        for (name, source) in use_bindings(ctx.tree(), argument, "") {
            let export = ExportMethodInfo::new(name, ExportType::ReExport, "pub_use", ctx.location(node))
                .from_module(&source);
            ctx.push(export);
        }
    }
}

/// Public functions of inherent `impl` blocks.
struct InherentImplProcessor;

impl ExportProcessor for InherentImplProcessor {
    fn name(&self) -> &'static str {
        "inherent_impl"
    }

    fn can_process(&self, node: Node<'_>, _ctx: &ExportContext<'_>) -> bool {
        node.kind() == "impl_item" && node.child_by_field_name("trait").is_none()
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let tree = ctx.tree();
        let (Some(ty), Some(body)) = (node.child_by_field_name("type"), node.child_by_field_name("body")) else {
            return;
        };
        let owner = type_name(tree, ty);

        let mut cursor = body.walk();
        let functions: Vec<_> = body
            .named_children(&mut cursor)
            .filter(|f| f.kind() == "function_item" && is_public(tree, *f))
            .collect();
        for function in functions {
            let Some(name) = field_text(tree, function, "name") else {
                continue;
            };
            let takes_self = function
                .child_by_field_name("parameters")
                .is_some_and(|p| has_child(p, "self_parameter"));
            let mut export = function_export(ctx, function, name).member_of(owner);
            export.export_type = ExportType::ClassMethod;
            export.is_static = Some(!takes_self);
            export.visibility = Some("public".to_string());
            ctx.push(export);
        }
    }
}

const CHAIN: &[&dyn ExportProcessor] = &[
    &PublicItemProcessor,
    &PublicUseProcessor,
    &InherentImplProcessor,
];

/// Owner of a function declared directly in an `impl` or `trait` body.
fn owner_of(tree: &SyntaxTree, function: Node<'_>) -> Option<String> {
    let container = function.parent()?.parent()?;
    match container.kind() {
        "impl_item" => container
            .child_by_field_name("type")
            .map(|ty| type_name(tree, ty).to_string()),
        "trait_item" => field_text(tree, container, "name").map(str::to_string),
        _ => None,
    }
}

impl LanguageAnalyzer for RustAnalyzer {
    fn language_id(&self) -> &'static str {
        "rust"
    }

    fn dependencies(&self, tree: &SyntaxTree) -> Vec<RawDependency> {
        let Some(root) = tree.root() else {
            return Vec::new();
        };

        let mut deps = Vec::new();
        walk(root, |node| {
            let found = match node.kind() {
                "use_declaration" => node
                    .child_by_field_name("argument")
                    .map(|a| (use_source(tree, a), DependencyKind::Use)),
                "extern_crate_declaration" => field_text(tree, node, "name")
                    .map(|n| (n.to_string(), DependencyKind::Use)),
                "mod_item" if node.child_by_field_name("body").is_none() => {
                    field_text(tree, node, "name").map(|n| (n.to_string(), DependencyKind::Include))
                }
                _ => None,
            };
            if let Some((source, kind)) = found {
                deps.push(RawDependency {
                    source,
                    kind,
                    line: node.start_position().row + 1,
                });
                return false;
            }
            true
        });
        deps
    }

    fn exports(&self, tree: &SyntaxTree) -> Vec<ExportMethodInfo> {
        run_chain(CHAIN, tree)
    }

    fn functions(&self, tree: &SyntaxTree) -> anyhow::Result<Vec<FunctionInfo>> {
        let Some(root) = tree.root() else {
            return Ok(Vec::new());
        };

        let mut sites = Vec::new();
        walk(root, |node| {
            if node.kind() == "function_item" {
                if let Some(name) = field_text(tree, node, "name") {
                    let mut site = FunctionSite::new(node, name, owner_of(tree, node));
                    site.is_async = is_async(node);
                    sites.push(site);
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

        let mut classes: Vec<ClassInfo> = Vec::new();
        let mut impls: HashMap<String, (Vec<String>, Vec<String>)> = HashMap::new();

        walk(root, |node| {
            let kind = match node.kind() {
                "struct_item" | "union_item" => ClassKind::Struct,
                "enum_item" => ClassKind::Enum,
                "trait_item" => ClassKind::Trait,
                "impl_item" => {
                    if let (Some(ty), Some(body)) =
                        (node.child_by_field_name("type"), node.child_by_field_name("body"))
                    {
                        let entry = impls.entry(type_name(tree, ty).to_string()).or_default();
                        if let Some(implemented) = node.child_by_field_name("trait") {
                            entry.1.push(type_name(tree, implemented).to_string());
                        }
                        let mut cursor = body.walk();
                        entry.0.extend(
                            body.named_children(&mut cursor)
                                .filter(|f| f.kind() == "function_item")
                                .filter_map(|f| field_text(tree, f, "name"))
                                .map(str::to_string),
                        );
                    }
                    return true;
                }
                _ => return true,
            };
            let Some(name) = field_text(tree, node, "name") else {
                return true;
            };

            let mut class = ClassInfo::new(name, kind, tree.location_of(node));
            class.is_exported = is_public(tree, node);
            if let Some(body) = node.child_by_field_name("body") {
                let mut cursor = body.walk();
                for member in body.named_children(&mut cursor) {
                    match member.kind() {
                        "field_declaration" | "enum_variant" => {
                            if let Some(field) = field_text(tree, member, "name") {
                                class.properties.push(field.to_string());
                            }
                        }
                        "function_item" | "function_signature_item" => {
                            if let Some(method) = field_text(tree, member, "name") {
                                class.methods.push(method.to_string());
                            }
                        }
                        _ => {}
                    }
                }
            }
            if let Some(bounds) = node.child_by_field_name("bounds") {
                let mut cursor = bounds.walk();
                class.heritage = bounds
                    .named_children(&mut cursor)
                    .map(|b| tree.text(b).to_string())
                    .collect();
            }
            classes.push(class);
            true
        });

        for class in &mut classes {
            if let Some((methods, traits)) = impls.remove(&class.name) {
                class.methods.extend(methods);
                class.heritage.extend(traits);
            }
        }
        classes
    }

    fn identifier_kinds(&self) -> &'static [&'static str] {
        &["identifier", "field_identifier", "type_identifier"]
    }

    fn comment_kinds(&self) -> &'static [&'static str] {
        &["line_comment", "block_comment"]
    }
}
