//! Go language analyzer using tree-sitter.
//!
//! Extracts:
//! - Imports (single and grouped)
//! - Exported (capitalized) functions, types, constants and variables
//! - Methods, attributed to their receiver type
//! - Structs and interfaces, with embedded types as heritage
//! - Control flow for complexity

use streaming_iterator::StreamingIterator;
use tracing::warn;
use tree_sitter::{Node, QueryCursor};

use crate::analysis::exports::{run_chain, ExportContext, ExportProcessor};
use crate::analysis::{
    field_text, measure_functions, parameter_names, unquote, walk, ClassInfo, ClassKind,
    DependencyKind, ExportMethodInfo, ExportType, FunctionInfo, FunctionSite, LanguageAnalyzer,
    LazyQuery, RawDependency,
};
use crate::parser::languages::go::COMPLEXITY_QUERY;
use crate::parser::SyntaxTree;

/// Tree-sitter query for extracting imports.
const IMPORT_QUERY: &str = r#"
(import_spec
  name: (_)? @alias
  path: (_) @path
) @import
"#;

/// Go language analyzer.
pub struct GoAnalyzer {
    complexity: LazyQuery,
    imports: LazyQuery,
}

impl GoAnalyzer {
    /// Create a new Go analyzer.
    pub fn new() -> Self {
        Self {
            complexity: LazyQuery::new(tree_sitter_go::LANGUAGE.into(), COMPLEXITY_QUERY),
            imports: LazyQuery::new(tree_sitter_go::LANGUAGE.into(), IMPORT_QUERY),
        }
    }

    /// Extract imports from a parsed file.
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
                let name = query.capture_names()[capture.index as usize];
                if name == "path" {
                    imports.push((
                        capture.node.start_byte(),
                        RawDependency {
                            source: unquote(tree.text(capture.node)),
                            kind: DependencyKind::Import,
                            line: capture.node.start_position().row + 1,
                        },
                    ));
                }
            }
        }

        // Sort by position for deterministic output
        imports.sort_by_key(|(offset, _)| *offset);
        Ok(imports.into_iter().map(|(_, d)| d).collect())
    }
}

impl Default for GoAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Type name of a method receiver (`func (s *Server) ...` gives `Server`).
fn receiver_type(tree: &SyntaxTree, method: Node<'_>) -> Option<String> {
    let receiver = method.child_by_field_name("receiver")?;
    let mut found = None;
    walk(receiver, |node| {
        if found.is_some() {
            return false;
        }
        if node.kind() == "type_identifier" {
            found = Some(tree.text(node).to_string());
            return false;
        }
        true
    });
    found
}

fn function_export(ctx: &ExportContext<'_>, node: Node<'_>, name: &str) -> ExportMethodInfo {
    let mut export = ExportMethodInfo::new(name, ExportType::Function, node.kind(), ctx.location(node));
    export.parameters = node
        .child_by_field_name("parameters")
        .map(|p| parameter_names(ctx.tree(), p));
    export.return_type = field_text(ctx.tree(), node, "result").map(str::to_string);
    export
}

/// `func Name(...)`
struct FunctionProcessor;

impl ExportProcessor for FunctionProcessor {
    fn name(&self) -> &'static str {
        "function"
    }

    fn can_process(&self, node: Node<'_>, ctx: &ExportContext<'_>) -> bool {
        node.kind() == "function_declaration"
            && field_text(ctx.tree(), node, "name").is_some_and(is_exported)
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        if let Some(name) = field_text(ctx.tree(), node, "name") {
            let export = function_export(ctx, node, name);
            ctx.push(export);
        }
    }
}

/// `func (r *Recv) Name(...)` on an exported receiver type.
struct MethodProcessor;

impl ExportProcessor for MethodProcessor {
    fn name(&self) -> &'static str {
        "method"
    }

    fn can_process(&self, node: Node<'_>, ctx: &ExportContext<'_>) -> bool {
        node.kind() == "method_declaration"
            && field_text(ctx.tree(), node, "name").is_some_and(is_exported)
            && receiver_type(ctx.tree(), node).is_some_and(|r| is_exported(&r))
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let (Some(name), Some(receiver)) = (field_text(ctx.tree(), node, "name"), receiver_type(ctx.tree(), node)) else {
            return;
        };
        let mut export = function_export(ctx, node, name).member_of(&receiver);
        export.export_type = ExportType::ClassMethod;
        export.is_static = Some(false);
        export.visibility = Some("public".to_string());
        ctx.push(export);
    }
}

/// `type Name struct {...}`, interfaces and other named types.
struct TypeProcessor;

impl ExportProcessor for TypeProcessor {
    fn name(&self) -> &'static str {
        "type"
    }

    fn can_process(&self, node: Node<'_>, _ctx: &ExportContext<'_>) -> bool {
        node.kind() == "type_declaration"
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let mut cursor = node.walk();
        let specs: Vec<_> = node
            .named_children(&mut cursor)
            .filter(|s| matches!(s.kind(), "type_spec" | "type_alias"))
            .collect();

        for spec in specs {
            let Some(name) = field_text(ctx.tree(), spec, "name").filter(|n| is_exported(n)) else {
                continue;
            };
            let body = spec.child_by_field_name("type");
            let is_struct = body.is_some_and(|b| b.kind() == "struct_type");
            let export_type = if is_struct { ExportType::Class } else { ExportType::Type };
            let export = ExportMethodInfo::new(name, export_type, spec.kind(), ctx.location(spec));
            ctx.push(export);

            if let Some(fields) = body.filter(|_| is_struct).and_then(field_list) {
                for (field, field_name) in named_fields(ctx.tree(), fields) {
                    if !is_exported(field_name) {
                        continue;
                    }
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
    }
}

/// `const` and `var` declarations, grouped or not.
struct ValueProcessor;

impl ExportProcessor for ValueProcessor {
    fn name(&self) -> &'static str {
        "value"
    }

    fn can_process(&self, node: Node<'_>, _ctx: &ExportContext<'_>) -> bool {
        matches!(node.kind(), "const_declaration" | "var_declaration")
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let keyword = if node.kind() == "const_declaration" { "const" } else { "var" };
        let mut specs = Vec::new();
        walk(node, |n| {
            if matches!(n.kind(), "const_spec" | "var_spec") {
                specs.push(n);
                return false;
            }
            true
        });

        for spec in specs {
            let mut cursor = spec.walk();
            let names: Vec<_> = spec.children_by_field_name("name", &mut cursor).collect();
            for name in names {
                let name = ctx.text(name);
                if is_exported(name) {
                    let export = ExportMethodInfo::new(name, ExportType::Variable, keyword, ctx.location(spec));
                    ctx.push(export);
                }
            }
        }
    }
}

const CHAIN: &[&dyn ExportProcessor] = &[
    &FunctionProcessor,
    &MethodProcessor,
    &TypeProcessor,
    &ValueProcessor,
];

/// The field list of a struct type.
fn field_list(struct_type: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = struct_type.walk();
    let list = struct_type
        .named_children(&mut cursor)
        .find(|c| c.kind() == "field_declaration_list");
    list
}

/// Named struct fields with their declarations; embedded fields are skipped.
fn named_fields<'t>(tree: &'t SyntaxTree, list: Node<'t>) -> Vec<(Node<'t>, &'t str)> {
    let mut fields = Vec::new();
    let mut cursor = list.walk();
    for declaration in list.named_children(&mut cursor) {
        if declaration.kind() != "field_declaration" {
            continue;
        }
        let mut names = declaration.walk();
        for name in declaration.children_by_field_name("name", &mut names) {
            fields.push((declaration, tree.text(name)));
        }
    }
    fields
}

/// Types embedded in a struct field list or interface body.
fn embedded_types(tree: &SyntaxTree, body: Node<'_>) -> Vec<String> {
    let mut embedded = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "field_declaration" if member.child_by_field_name("name").is_none() => {
                if let Some(ty) = member.child_by_field_name("type") {
                    embedded.push(tree.text(ty).trim_start_matches('*').to_string());
                }
            }
            "type_elem" | "constraint_elem" => embedded.push(tree.text(member).to_string()),
            _ => {}
        }
    }
    embedded
}

impl LanguageAnalyzer for GoAnalyzer {
    fn language_id(&self) -> &'static str {
        "go"
    }

    fn dependencies(&self, tree: &SyntaxTree) -> Vec<RawDependency> {
        match self.extract_imports(tree) {
            Ok(imports) => imports,
            Err(e) => {
                warn!(error = %e, "go import query failed");
                Vec::new()
            }
        }
    }

    fn exports(&self, tree: &SyntaxTree) -> Vec<ExportMethodInfo> {
        run_chain(CHAIN, tree)
    }

    fn functions(&self, tree: &SyntaxTree) -> anyhow::Result<Vec<FunctionInfo>> {
        let Some(root) = tree.root() else {
            return Ok(Vec::new());
        };

        let mut sites = Vec::new();
        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            let Some(name) = field_text(tree, node, "name") else {
                continue;
            };
            match node.kind() {
                "function_declaration" => sites.push(FunctionSite::new(node, name, None)),
                "method_declaration" => {
                    sites.push(FunctionSite::new(node, name, receiver_type(tree, node)))
                }
                _ => {}
            }
        }

        measure_functions(tree, sites, &self.complexity, &self.exports(tree))
    }

    fn classes(&self, tree: &SyntaxTree) -> Vec<ClassInfo> {
        let Some(root) = tree.root() else {
            return Vec::new();
        };

        let mut classes: Vec<ClassInfo> = Vec::new();
        let mut methods: Vec<(String, String)> = Vec::new();
        walk(root, |node| {
            match node.kind() {
                "type_spec" => {
                    let (Some(name), Some(body)) =
                        (field_text(tree, node, "name"), node.child_by_field_name("type"))
                    else {
                        return true;
                    };
                    let mut class = match body.kind() {
                        "struct_type" => {
                            let mut class = ClassInfo::new(name, ClassKind::Struct, tree.location_of(node));
                            if let Some(fields) = field_list(body) {
                                class.properties = named_fields(tree, fields)
                                    .into_iter()
                                    .map(|(_, n)| n.to_string())
                                    .collect();
                                class.heritage = embedded_types(tree, fields);
                            }
                            class
                        }
                        "interface_type" => {
                            let mut class = ClassInfo::new(name, ClassKind::Interface, tree.location_of(node));
                            let mut cursor = body.walk();
                            class.methods = body
                                .named_children(&mut cursor)
                                .filter(|m| matches!(m.kind(), "method_elem" | "method_spec"))
                                .filter_map(|m| field_text(tree, m, "name"))
                                .map(str::to_string)
                                .collect();
                            class.heritage = embedded_types(tree, body);
                            class
                        }
                        _ => return true,
                    };
                    class.is_exported = is_exported(name);
                    classes.push(class);
                }
                "method_declaration" => {
                    if let (Some(receiver), Some(name)) =
                        (receiver_type(tree, node), field_text(tree, node, "name"))
                    {
                        methods.push((receiver, name.to_string()));
                    }
                }
                _ => {}
            }
            true
        });

        for (receiver, method) in methods {
            if let Some(class) = classes.iter_mut().find(|c| c.name == receiver) {
                class.methods.push(method);
            }
        }
        classes
    }

    fn identifier_kinds(&self) -> &'static [&'static str] {
        &["identifier", "field_identifier", "type_identifier", "package_identifier"]
    }
}
