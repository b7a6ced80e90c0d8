//! Java language analyzer using tree-sitter.

use tree_sitter::Node;

use crate::analysis::exports::{run_chain, ExportContext, ExportProcessor};
use crate::analysis::{
    ancestor, field_text, has_child, measure_functions, parameter_names, walk, ClassInfo,
    ClassKind, DependencyKind, ExportMethodInfo, ExportType, FunctionInfo, FunctionSite,
    LanguageAnalyzer, LazyQuery, RawDependency,
};
use crate::parser::languages::java::COMPLEXITY_QUERY;
use crate::parser::SyntaxTree;

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

pub struct JavaAnalyzer {
    complexity: LazyQuery,
}

impl JavaAnalyzer {
    pub fn new() -> Self {
        Self {
            complexity: LazyQuery::new(tree_sitter_java::LANGUAGE.into(), COMPLEXITY_QUERY),
        }
    }
}

impl Default for JavaAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Modifier keywords of a declaration (`public`, `static`, ...).
fn modifiers<'t>(tree: &'t SyntaxTree, node: Node<'_>) -> Vec<&'t str> {
    let mut cursor = node.walk();
    let Some(list) = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "modifiers")
    else {
        return Vec::new();
    };
    let mut words = list.walk();
    let modifiers = list
        .children(&mut words)
        .filter(|m| !m.kind().contains("annotation"))
        .map(|m| tree.text(m))
        .collect();
    modifiers
}

/// Access level from modifiers; members of interfaces are implicitly public.
fn visibility(modifiers: &[&str], in_interface: bool) -> &'static str {
    if modifiers.contains(&"public") || in_interface {
        "public"
    } else if modifiers.contains(&"protected") {
        "protected"
    } else if modifiers.contains(&"private") {
        "private"
    } else {
        "package"
    }
}

fn export_type_of(kind: &str) -> ExportType {
    match kind {
        "interface_declaration" | "annotation_type_declaration" => ExportType::Type,
        "enum_declaration" => ExportType::Enum,
        _ => ExportType::Class,
    }
}

/// Member declarations of a type body, looking into enum body declarations.
fn body_members<'t>(body: Node<'t>) -> Vec<Node<'t>> {
    let mut members = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if member.kind() == "enum_body_declarations" {
            let mut inner = member.walk();
            members.extend(member.named_children(&mut inner));
        } else {
            members.push(member);
        }
    }
    members
}

/// Declarator names of a field declaration.
fn field_names<'t>(tree: &'t SyntaxTree, field: Node<'_>) -> Vec<&'t str> {
    let mut cursor = field.walk();
    let declarators: Vec<_> = field.children_by_field_name("declarator", &mut cursor).collect();
    declarators
        .into_iter()
        .filter_map(|d| field_text(tree, d, "name"))
        .collect()
}

/// Public top-level types and their non-private members.
struct PublicTypeProcessor;

impl ExportProcessor for PublicTypeProcessor {
    fn name(&self) -> &'static str {
        "public_type"
    }

    fn can_process(&self, node: Node<'_>, ctx: &ExportContext<'_>) -> bool {
        TYPE_DECLARATIONS.contains(&node.kind()) && modifiers(ctx.tree(), node).contains(&"public")
    }

    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>) {
        let tree = ctx.tree();
        let Some(type_name) = field_text(tree, node, "name") else {
            return;
        };
        let export = ExportMethodInfo::new(type_name, export_type_of(node.kind()), node.kind(), ctx.location(node));
        ctx.push(export);

        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let in_interface = node.kind() == "interface_declaration";

        for member in body_members(body) {
            let member_modifiers = modifiers(tree, member);
            let access = visibility(&member_modifiers, in_interface);
            if access == "private" {
                continue;
            }
            let is_static = member_modifiers.contains(&"static");

            match member.kind() {
                "method_declaration" | "constructor_declaration" => {
                    let Some(name) = field_text(tree, member, "name") else {
                        continue;
                    };
                    let mut export =
                        ExportMethodInfo::new(name, ExportType::ClassMethod, member.kind(), ctx.location(member))
                            .member_of(type_name);
                    export.is_static = Some(is_static);
                    export.visibility = Some(access.to_string());
                    export.parameters = member
                        .child_by_field_name("parameters")
                        .map(|p| parameter_names(tree, p));
                    export.return_type = field_text(tree, member, "type").map(str::to_string);
                    ctx.push(export);
                }
                "field_declaration" | "constant_declaration" => {
                    for name in field_names(tree, member) {
                        let mut export = ExportMethodInfo::new(
                            name,
                            ExportType::ClassProperty,
                            member.kind(),
                            ctx.location(member),
                        )
                        .member_of(type_name);
                        export.is_static = Some(is_static || in_interface);
                        export.visibility = Some(access.to_string());
                        ctx.push(export);
                    }
                }
                _ => {}
            }
        }
    }
}

const CHAIN: &[&dyn ExportProcessor] = &[&PublicTypeProcessor];

impl LanguageAnalyzer for JavaAnalyzer {
    fn language_id(&self) -> &'static str {
        "java"
    }

    fn dependencies(&self, tree: &SyntaxTree) -> Vec<RawDependency> {
        let Some(root) = tree.root() else {
            return Vec::new();
        };

        let mut cursor = root.walk();
        let imports = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "import_declaration")
            .filter_map(|import| {
                let path = import.named_child(0)?;
                let mut source = tree.text(path).to_string();
                if has_child(import, "asterisk") {
                    source.push_str(".*");
                }
                Some(RawDependency {
                    source,
                    kind: DependencyKind::Import,
                    line: import.start_position().row + 1,
                })
            })
            .collect();
        imports
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
            if matches!(node.kind(), "method_declaration" | "constructor_declaration") {
                if let Some(name) = field_text(tree, node, "name") {
                    let parent = ancestor(node, TYPE_DECLARATIONS)
                        .and_then(|t| field_text(tree, t, "name"))
                        .map(str::to_string);
                    sites.push(FunctionSite::new(node, name, parent));
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

        let mut classes = Vec::new();
        walk(root, |node| {
            if !TYPE_DECLARATIONS.contains(&node.kind()) {
                return true;
            }
            let Some(name) = field_text(tree, node, "name") else {
                return true;
            };
            let kind = match node.kind() {
                "interface_declaration" | "annotation_type_declaration" => ClassKind::Interface,
                "enum_declaration" => ClassKind::Enum,
                "record_declaration" => ClassKind::Struct,
                _ => ClassKind::Class,
            };

            let mut class = ClassInfo::new(name, kind, tree.location_of(node));
            class.heritage = heritage(tree, node);
            class.is_exported = modifiers(tree, node).contains(&"public");
            if let Some(body) = node.child_by_field_name("body") {
                for member in body_members(body) {
                    match member.kind() {
                        "method_declaration" | "constructor_declaration" => {
                            if let Some(method) = field_text(tree, member, "name") {
                                class.methods.push(method.to_string());
                            }
                        }
                        "field_declaration" | "constant_declaration" => {
                            class
                                .properties
                                .extend(field_names(tree, member).into_iter().map(str::to_string));
                        }
                        "enum_constant" => {
                            if let Some(constant) = field_text(tree, member, "name") {
                                class.properties.push(constant.to_string());
                            }
                        }
                        _ => {}
                    }
                }
            }
            classes.push(class);
            true
        });
        classes
    }

    fn identifier_kinds(&self) -> &'static [&'static str] {
        &["identifier", "type_identifier"]
    }

    fn comment_kinds(&self) -> &'static [&'static str] {
        &["line_comment", "block_comment"]
    }
}

/// `extends` and `implements` types.
fn heritage(tree: &SyntaxTree, node: Node<'_>) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for clause in node.named_children(&mut cursor) {
        if !matches!(clause.kind(), "superclass" | "super_interfaces" | "extends_interfaces") {
            continue;
        }
        walk(clause, |n| match n.kind() {
            "type_list" | "superclass" | "super_interfaces" | "extends_interfaces" => true,
            _ if n.is_named() => {
                names.push(tree.text(n).to_string());
                false
            }
            _ => false,
        });
    }
    names
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::parser::languages::java;
    use crate::parser::SyntaxProvider;

    fn parse(source: &str) -> SyntaxTree {
        java::provider()
            .parse(source, Path::new("Test.java"))
            .ast()
            .cloned()
            .unwrap()
    }

    const SOURCE: &str = r#"package com.example;

import java.util.List;
import java.util.concurrent.*;
import static org.junit.Assert.assertEquals;

/** A user service. */
public class UserService extends BaseService implements Service, Closeable {
    public static final int LIMIT = 10;
    private final Repo repo;
    protected String name;

    public UserService(Repo repo) {
        this.repo = repo;
    }

    public List<User> find(String query, int limit) {
        if (query == null || limit <= 0) {
            return List.of();
        }
        return repo.search(query);
    }

    private void reset() {}

    static class Helper {}
}

class Internal {}
"#;

    #[test]
    fn test_imports() {
        let deps = JavaAnalyzer::new().dependencies(&parse(SOURCE));
        let sources: Vec<_> = deps.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(
            sources,
            vec!["java.util.List", "java.util.concurrent.*", "org.junit.Assert.assertEquals"]
        );
        assert_eq!(deps[0].line, 3);
    }

    #[test]
    fn test_exports() {
        let exports = JavaAnalyzer::new().exports(&parse(SOURCE));
        let names: Vec<_> = exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["UserService", "LIMIT", "name", "UserService", "find"]);

        let limit = &exports[1];
        assert_eq!(limit.is_static, Some(true));
        assert_eq!(limit.visibility.as_deref(), Some("public"));

        let find = &exports[4];
        assert_eq!(find.export_type, ExportType::ClassMethod);
        assert_eq!(find.parameters.as_deref(), Some(&["query".to_string(), "limit".to_string()][..]));
        assert_eq!(find.return_type.as_deref(), Some("List<User>"));
    }

    #[test]
    fn test_functions() {
        let functions = JavaAnalyzer::new().functions(&parse(SOURCE)).unwrap();
        let names: Vec<_> = functions.iter().map(|f| f.qualified_name()).collect();
        assert_eq!(names, vec!["UserService.UserService", "UserService.find", "UserService.reset"]);
        // if + ||
        assert_eq!(functions[1].complexity, 3);
        assert!(functions[1].is_exported);
        assert!(!functions[2].is_exported);
    }

    #[test]
    fn test_classes() {
        let classes = JavaAnalyzer::new().classes(&parse(SOURCE));
        let names: Vec<_> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["UserService", "Helper", "Internal"]);

        let service = &classes[0];
        assert_eq!(service.heritage, vec!["BaseService", "Service", "Closeable"]);
        assert_eq!(service.properties, vec!["LIMIT", "repo", "name"]);
        assert_eq!(service.methods, vec!["UserService", "find", "reset"]);
        assert!(service.is_exported);
        assert!(!classes[2].is_exported);
    }

    #[test]
    fn test_comments() {
        let comments = JavaAnalyzer::new().comments(&parse(SOURCE));
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "A user service.");
    }
}
