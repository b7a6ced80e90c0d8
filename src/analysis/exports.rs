//! Export extraction pipeline.
//!
//! Exports are found in three passes:
//!
//! 1. A per-language chain of [`ExportProcessor`]s visits every top-level
//!    node. The first processor that accepts a node handles it, so the chain
//!    order decides which processor wins on overlapping forms.
//! 2. [`supplement_reexports`] adds `export ... from` re-exports found in the
//!    comment-masked source text, skipping names already exported.
//! 3. [`finalize`] drops duplicates and groups class members under their class.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;
use tree_sitter::Node;

use crate::parser::{LineIndex, Location, SyntaxTree};

use super::{ClassExportInfo, ExportFacts, ExportMethodInfo, ExportType};

lazy_static! {
    /// `export { a, b as c } from 'm'` (and `export type { .. } from`).
    static ref NAMED_REEXPORT: Regex = Regex::new(
        r#"(?m)^[ \t]*export\s+(?:type\s+)?\{(?P<names>[^}]*)\}\s*from\s*["'](?P<source>[^"'\n]+)["']"#
    ).unwrap();

    /// `export * from 'm'` and `export * as ns from 'm'`.
    static ref WILDCARD_REEXPORT: Regex = Regex::new(
        r#"(?m)^[ \t]*export\s+\*(?:\s+as\s+(?P<alias>[\w$]+))?\s+from\s*["'](?P<source>[^"'\n]+)["']"#
    ).unwrap();
}

/// State shared by the processors of one chain run.
pub struct ExportContext<'t> {
    tree: &'t SyntaxTree,
    exports: Vec<ExportMethodInfo>,
}

impl<'t> ExportContext<'t> {
    pub fn new(tree: &'t SyntaxTree) -> Self {
        Self {
            tree,
            exports: Vec::new(),
        }
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn text(&self, node: Node) -> &'t str {
        self.tree.text(node)
    }

    pub fn location(&self, node: Node) -> Location {
        self.tree.location_of(node)
    }

    pub fn push(&mut self, export: ExportMethodInfo) {
        self.exports.push(export);
    }

    /// Exports recorded so far.
    pub fn exports(&self) -> &[ExportMethodInfo] {
        &self.exports
    }

    pub fn into_exports(self) -> Vec<ExportMethodInfo> {
        self.exports
    }
}

/// One link of an export chain.
pub trait ExportProcessor: Send + Sync {
    /// Short name used in trace output.
    fn name(&self) -> &'static str;

    /// Whether this processor handles the top-level node.
    fn can_process(&self, node: Node<'_>, ctx: &ExportContext<'_>) -> bool;

    /// Record the exports declared by the node.
    fn process(&self, node: Node<'_>, ctx: &mut ExportContext<'_>);
}

/// Run a processor chain over the top-level nodes of a tree.
pub fn run_chain(chain: &[&dyn ExportProcessor], tree: &SyntaxTree) -> Vec<ExportMethodInfo> {
    let Some(root) = tree.root() else {
        return Vec::new();
    };

    let mut ctx = ExportContext::new(tree);
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        if let Some(processor) = chain.iter().find(|p| p.can_process(node, &ctx)) {
            trace!(
                processor = processor.name(),
                kind = node.kind(),
                line = node.start_position().row + 1,
                "export node"
            );
            processor.process(node, &mut ctx);
        }
    }

    ctx.into_exports()
}

/// Byte offsets of top-level `export ... from` statements.
pub fn reexport_anchors(tree: &SyntaxTree) -> HashSet<usize> {
    let Some(root) = tree.root() else {
        return HashSet::new();
    };
    let mut cursor = root.walk();
    let anchors = root
        .named_children(&mut cursor)
        .filter(|node| node.kind() == "export_statement" && node.child_by_field_name("source").is_some())
        .map(|node| node.start_byte())
        .collect();
    anchors
}

/// Offset of the `export` keyword of a match that may start with indentation.
fn keyword_offset(whole: regex::Match<'_>) -> usize {
    let text = whole.as_str();
    whole.start() + (text.len() - text.trim_start().len())
}

/// Add `export ... from` re-exports found in comment-masked source.
///
/// Names already present in `exports` are left alone. A bare wildcard
/// re-export is recorded as `* from <module>`. With `anchors`, only matches
/// starting at one of those offsets count; text inside string literals never
/// lines up with a statement.
pub fn supplement_reexports(
    masked: &str,
    lines: &LineIndex,
    anchors: Option<&HashSet<usize>>,
    exports: &mut Vec<ExportMethodInfo>,
) {
    let mut known: HashSet<String> = exports.iter().map(|e| e.name.clone()).collect();
    let mut found: Vec<(usize, ExportMethodInfo)> = Vec::new();
    let anchored = |whole: regex::Match<'_>| anchors.map_or(true, |a| a.contains(&keyword_offset(whole)));

    for caps in NAMED_REEXPORT.captures_iter(masked) {
        let (Some(whole), Some(names)) = (caps.get(0), caps.name("names")) else {
            continue;
        };
        if !anchored(whole) {
            continue;
        }
        let source = &caps["source"];
        for spec in names.as_str().split(',') {
            let spec = spec.trim();
            let spec = spec.strip_prefix("type ").unwrap_or(spec).trim();
            if spec.is_empty() {
                continue;
            }
            let exported = match spec.split_once(" as ") {
                Some((_, alias)) => alias.trim(),
                None => spec,
            };
            if !known.insert(exported.to_string()) {
                continue;
            }
            found.push((
                whole.start(),
                ExportMethodInfo::new(
                    exported,
                    ExportType::ReExport,
                    "export_from",
                    location(lines, whole.start(), whole.end()),
                )
                .from_module(source),
            ));
        }
    }

    for caps in WILDCARD_REEXPORT.captures_iter(masked) {
        let Some(whole) = caps.get(0).filter(|whole| anchored(*whole)) else {
            continue;
        };
        let source = &caps["source"];
        let name = match caps.name("alias") {
            Some(alias) => alias.as_str().to_string(),
            None => format!("* from {}", source),
        };
        if !known.insert(name.clone()) {
            continue;
        }
        found.push((
            whole.start(),
            ExportMethodInfo::new(
                name,
                ExportType::ReExport,
                "export_star",
                location(lines, whole.start(), whole.end()),
            )
            .from_module(source),
        ));
    }

    found.sort_by_key(|(offset, _)| *offset);
    exports.extend(found.into_iter().map(|(_, e)| e));
}

fn location(lines: &LineIndex, start: usize, end: usize) -> Location {
    let (line, column) = lines.position(start);
    let (end_line, end_column) = lines.position(end);
    Location {
        line,
        column,
        end_line,
        end_column,
    }
}

/// Deduplicate exports and aggregate class members.
///
/// Duplicates share name, export type and parent class; the first one wins
/// and order is otherwise kept. A dropped duplicate that was the default
/// export marks the kept entry as default. Every class export gets a
/// [`ClassExportInfo`] with its methods and properties; members without a
/// visibility are reported as public there.
pub fn finalize(all: Vec<ExportMethodInfo>) -> ExportFacts {
    let mut seen: HashMap<(String, ExportType, Option<String>), usize> = HashMap::new();
    let mut exports: Vec<ExportMethodInfo> = Vec::with_capacity(all.len());
    for export in all {
        let key = (export.name.clone(), export.export_type, export.parent_class.clone());
        match seen.get(&key) {
            Some(&kept) => exports[kept].is_default |= export.is_default,
            None => {
                seen.insert(key, exports.len());
                exports.push(export);
            }
        }
    }

    let classes = exports
        .iter()
        .filter(|e| e.export_type == ExportType::Class)
        .map(|class| {
            let members = |kind: ExportType| -> Vec<ExportMethodInfo> {
                exports
                    .iter()
                    .filter(|m| {
                        m.export_type == kind && m.parent_class.as_deref() == Some(class.name.as_str())
                    })
                    .cloned()
                    .map(|mut m| {
                        m.visibility.get_or_insert_with(|| "public".to_string());
                        m
                    })
                    .collect()
            };
            ClassExportInfo {
                name: class.name.clone(),
                location: class.location,
                is_default: class.is_default,
                methods: members(ExportType::ClassMethod),
                properties: members(ExportType::ClassProperty),
            }
        })
        .collect();

    let default_export = exports.iter().find(|e| e.is_default).map(|e| e.name.clone());

    ExportFacts {
        exports,
        classes,
        default_export,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export(name: &str, export_type: ExportType) -> ExportMethodInfo {
        ExportMethodInfo::new(name, export_type, "test", Location::default())
    }

    #[test]
    fn test_finalize_dedups_first_wins() {
        let first = export("Foo", ExportType::Class).default_export();
        let second = export("Foo", ExportType::Class);
        let facts = finalize(vec![first, second]);

        assert_eq!(facts.exports.len(), 1);
        assert!(facts.exports[0].is_default);
        assert_eq!(facts.default_export.as_deref(), Some("Foo"));
    }

    #[test]
    fn test_finalize_carries_default_from_dropped_duplicate() {
        let declared = export("Foo", ExportType::Class);
        let defaulted = export("Foo", ExportType::Class).default_export();
        let facts = finalize(vec![declared, defaulted]);

        assert_eq!(facts.exports.len(), 1);
        assert!(facts.exports[0].is_default);
        assert_eq!(facts.default_export.as_deref(), Some("Foo"));
        assert!(facts.classes[0].is_default);
    }

    #[test]
    fn test_supplement_respects_anchors() {
        let source = "const s = `\nexport { fake } from './nope';\n`;\nexport { real } from './yes';\n";
        let lines = LineIndex::new(source);
        let anchors: HashSet<usize> = [source.find("export { real }").unwrap()].into_iter().collect();
        let mut exports = Vec::new();
        supplement_reexports(source, &lines, Some(&anchors), &mut exports);

        let names: Vec<_> = exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["real"]);
    }

    #[test]
    fn test_finalize_keeps_same_name_different_parent() {
        let facts = finalize(vec![
            export("A", ExportType::Class),
            export("B", ExportType::Class),
            export("run", ExportType::ClassMethod).member_of("A"),
            export("run", ExportType::ClassMethod).member_of("B"),
        ]);
        assert_eq!(facts.exports.len(), 4);
        assert_eq!(facts.classes.len(), 2);
        assert_eq!(facts.classes[0].methods.len(), 1);
        assert_eq!(facts.classes[1].methods.len(), 1);
    }

    #[test]
    fn test_finalize_defaults_member_visibility() {
        let mut private = export("secret", ExportType::ClassProperty).member_of("Box");
        private.visibility = Some("private".to_string());
        let facts = finalize(vec![
            export("Box", ExportType::Class),
            export("open", ExportType::ClassMethod).member_of("Box"),
            private,
        ]);

        let class = &facts.classes[0];
        assert_eq!(class.methods[0].visibility.as_deref(), Some("public"));
        assert_eq!(class.properties[0].visibility.as_deref(), Some("private"));
        // the flat list is left untouched
        assert!(facts.exports[1].visibility.is_none());
    }

    #[test]
    fn test_supplement_named_and_wildcard() {
        let source = "export { a, b as c } from './m';\nexport * from './all';\nexport * as ns from './ns';\n";
        let lines = LineIndex::new(source);
        let mut exports = vec![export("a", ExportType::Function)];
        supplement_reexports(source, &lines, None, &mut exports);

        let names: Vec<_> = exports.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "* from ./all", "ns"]);
        assert_eq!(exports[1].export_type, ExportType::ReExport);
        assert_eq!(exports[1].source.as_deref(), Some("./m"));
        assert_eq!(exports[2].location.line, 2);
    }

    #[test]
    fn test_supplement_ignores_masked_text() {
        let source = "                                      \nexport const x = 1;\n";
        let lines = LineIndex::new(source);
        let mut exports = Vec::new();
        supplement_reexports(source, &lines, None, &mut exports);
        assert!(exports.is_empty());
    }
}
