//! Fact structures extracted from source files.
//!
//! These are the serialized shapes carried in `AnalysisResult::extracted_data`,
//! identical whether they came from a grammar walk or from pattern matching.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::Location;

/// How a dependency is brought into a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Import,
    Require,
    Include,
    Use,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Import => "import",
            DependencyKind::Require => "require",
            DependencyKind::Include => "include",
            DependencyKind::Use => "use",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A dependency as found in the source, before locality and resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDependency {
    pub source: String,
    pub kind: DependencyKind,
    /// 1-indexed line.
    pub line: usize,
}

/// A dependency fact.
///
/// `is_local` comes from the language's locality rule and `resolved_path`
/// only ever names a file or directory verified to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInfo {
    pub source: String,
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    pub is_local: bool,
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
}

/// Category of an exported symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportType {
    Function,
    Class,
    Variable,
    Type,
    Enum,
    ClassMethod,
    ClassProperty,
    ReExport,
}

impl ExportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Function => "function",
            ExportType::Class => "class",
            ExportType::Variable => "variable",
            ExportType::Type => "type",
            ExportType::Enum => "enum",
            ExportType::ClassMethod => "class_method",
            ExportType::ClassProperty => "class_property",
            ExportType::ReExport => "re_export",
        }
    }

    /// Whether this export belongs to a class.
    pub fn is_member(&self) -> bool {
        matches!(self, ExportType::ClassMethod | ExportType::ClassProperty)
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One exported symbol (or class member).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMethodInfo {
    pub name: String,
    pub export_type: ExportType,
    /// Syntactic form of the declaration (e.g. "function_declaration", "const").
    pub declaration_type: String,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_static: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_async: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    /// Module a re-export comes from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ExportMethodInfo {
    /// A plain named export with every optional field unset.
    pub fn new(
        name: impl Into<String>,
        export_type: ExportType,
        declaration_type: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            name: name.into(),
            export_type,
            declaration_type: declaration_type.into(),
            location,
            parent_class: None,
            is_static: None,
            is_async: None,
            visibility: None,
            parameters: None,
            return_type: None,
            is_default: false,
            source: None,
        }
    }

    pub fn member_of(mut self, class: &str) -> Self {
        self.parent_class = Some(class.to_string());
        self
    }

    pub fn default_export(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn from_module(mut self, module: &str) -> Self {
        self.source = Some(module.to_string());
        self
    }

    /// Key under which exports are deduplicated.
    pub fn dedup_key(&self) -> (&str, ExportType, Option<&str>) {
        (&self.name, self.export_type, self.parent_class.as_deref())
    }
}

/// An exported class with its members grouped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassExportInfo {
    pub name: String,
    pub location: Location,
    pub is_default: bool,
    pub methods: Vec<ExportMethodInfo>,
    pub properties: Vec<ExportMethodInfo>,
}

/// Output of the export pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFacts {
    pub exports: Vec<ExportMethodInfo>,
    pub classes: Vec<ClassExportInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_export: Option<String>,
}

/// A function or method, exported or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInfo {
    pub name: String,
    /// "function" or "method".
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub location: Location,
    pub parameters: Vec<String>,
    pub is_async: bool,
    pub is_exported: bool,
    pub line_count: usize,
    pub complexity: u32,
}

impl FunctionInfo {
    pub fn is_method(&self) -> bool {
        self.kind == "method"
    }

    /// Name qualified with its parent (`Parent.name`).
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent, self.name),
            None => self.name.clone(),
        }
    }
}

/// Kind of type-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Class,
    Interface,
    Struct,
    Enum,
    Trait,
    Module,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Struct => "struct",
            ClassKind::Enum => "enum",
            ClassKind::Trait => "trait",
            ClassKind::Module => "module",
        }
    }

    /// Map a declaration keyword to a kind.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "interface" | "protocol" => ClassKind::Interface,
            "struct" | "record" => ClassKind::Struct,
            "enum" => ClassKind::Enum,
            "trait" => ClassKind::Trait,
            "module" | "object" | "namespace" => ClassKind::Module,
            _ => ClassKind::Class,
        }
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A class-like declaration with its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub name: String,
    pub kind: ClassKind,
    pub location: Location,
    pub methods: Vec<String>,
    pub properties: Vec<String>,
    /// Superclasses and implemented interfaces.
    pub heritage: Vec<String>,
    pub is_exported: bool,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>, kind: ClassKind, location: Location) -> Self {
        Self {
            name: name.into(),
            kind,
            location,
            methods: Vec::new(),
            properties: Vec::new(),
            heritage: Vec::new(),
            is_exported: false,
        }
    }
}

/// A distinct identifier with its usage count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierInfo {
    pub name: String,
    pub count: usize,
    pub first_line: usize,
}

/// Comment syntax category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    Line,
    Block,
    Doc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentInfo {
    pub text: String,
    pub line: usize,
    pub kind: CommentKind,
}

/// A TODO/FIXME/HACK/NOTE/XXX marker found in a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoInfo {
    pub marker: String,
    pub text: String,
    pub line: usize,
}

/// An `@key: value` doc annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub key: String,
    pub values: Vec<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentFacts {
    pub comments: Vec<CommentInfo>,
    pub todos: Vec<TodoInfo>,
    pub annotations: Vec<Annotation>,
}
