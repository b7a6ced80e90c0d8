//! Built-in pattern tables.

use lazy_static::lazy_static;
use regex::Regex;

use super::resolver::{identity, python_module, rust_module, Candidate, Resolver};
use super::{
    accept_all, BlockStyle, DependencyPattern, ExportPattern, LanguageConfig, SourceSplit,
};
use crate::analysis::{DependencyKind, ExportType};

const C_STYLE_COMMENTS: &str = r"//[^\n]*|(?s:/\*.*?\*/)";

const TS_CANDIDATES: &[Candidate] = &[
    Candidate::AsIsWithExtension,
    Candidate::ReplaceExtension { from: ".js", to: ".ts" },
    Candidate::ReplaceExtension { from: ".js", to: ".tsx" },
    Candidate::Append(".ts"),
    Candidate::Join("index.ts"),
    Candidate::Append(".tsx"),
    Candidate::Join("index.tsx"),
    Candidate::Append(".d.ts"),
];

const JS_CANDIDATES: &[Candidate] = &[
    Candidate::AsIsWithExtension,
    Candidate::Append(".js"),
    Candidate::Join("index.js"),
    Candidate::Append(".jsx"),
    Candidate::Append(".mjs"),
    Candidate::Append(".cjs"),
    Candidate::ReplaceExtension { from: ".js", to: ".ts" },
    Candidate::Append(".ts"),
    Candidate::Join("index.ts"),
];

const PYTHON_CANDIDATES: &[Candidate] = &[Candidate::Append(".py"), Candidate::Join("__init__.py")];
const GO_CANDIDATES: &[Candidate] = &[Candidate::Directory];
const RUST_CANDIDATES: &[Candidate] = &[Candidate::Append(".rs"), Candidate::Join("mod.rs")];
const RUBY_CANDIDATES: &[Candidate] = &[Candidate::Append(".rb"), Candidate::AsIs];
const AS_IS: &[Candidate] = &[Candidate::AsIs];

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

fn dep(pattern: &str, kind: DependencyKind, is_local: fn(&str) -> bool) -> DependencyPattern {
    DependencyPattern {
        scanner: re(pattern),
        kind,
        split: SourceSplit::Single,
        is_local,
    }
}

fn dep_split(
    pattern: &str,
    kind: DependencyKind,
    split: SourceSplit,
    is_local: fn(&str) -> bool,
) -> DependencyPattern {
    DependencyPattern {
        split,
        ..dep(pattern, kind, is_local)
    }
}

fn export(pattern: &str, export_type: ExportType) -> ExportPattern {
    ExportPattern {
        scanner: re(pattern),
        export_type,
        is_default: false,
        accept: accept_all,
    }
}

fn default_export(pattern: &str, export_type: ExportType) -> ExportPattern {
    ExportPattern {
        is_default: true,
        ..export(pattern, export_type)
    }
}

fn export_if(pattern: &str, export_type: ExportType, accept: fn(&str, &str) -> bool) -> ExportPattern {
    ExportPattern {
        accept,
        ..export(pattern, export_type)
    }
}

fn starts_relative(source: &str) -> bool {
    source.starts_with('.') || source.starts_with('/')
}

fn starts_with_dot(source: &str) -> bool {
    source.starts_with('.')
}

fn always(_source: &str) -> bool {
    true
}

fn never(_source: &str) -> bool {
    false
}

fn js_locality(source: &str, _kind: DependencyKind) -> bool {
    starts_relative(source)
}

fn dot_locality(source: &str, _kind: DependencyKind) -> bool {
    starts_with_dot(source)
}

fn never_local(_source: &str, _kind: DependencyKind) -> bool {
    false
}

fn rust_locality(source: &str, kind: DependencyKind) -> bool {
    kind == DependencyKind::Include
        || ["crate", "self", "super"]
            .iter()
            .any(|root| source == *root || source.starts_with(&format!("{}::", root)))
}

fn rust_use_is_local(source: &str) -> bool {
    rust_locality(source, DependencyKind::Use)
}

fn php_locality(source: &str, kind: DependencyKind) -> bool {
    kind == DependencyKind::Include && php_include_is_local(source)
}

fn php_include_is_local(source: &str) -> bool {
    !source.starts_with('/') && !source.contains("://")
}

fn c_locality(_source: &str, kind: DependencyKind) -> bool {
    kind == DependencyKind::Include
}

fn is_control_keyword(name: &str) -> bool {
    matches!(
        name,
        "if" | "else" | "for" | "while" | "switch" | "return" | "do" | "case" | "sizeof" | "catch"
    )
}

fn c_function_is_exported(name: &str, matched: &str) -> bool {
    !is_control_keyword(name) && !matched.trim_start().starts_with("static")
}

fn js_family(language: &'static str, candidates: &'static [Candidate]) -> LanguageConfig {
    LanguageConfig {
        language,
        dependency_patterns: vec![
            dep(
                r#"(?m)^\s*import\s+(?:type\s+)?(?:[\w*{}\s,$]+?\s+from\s+)?["'](?P<source>[^"'\n]+)["']"#,
                DependencyKind::Import,
                starts_relative,
            ),
            dep(
                r#"(?m)^\s*export\s+(?:type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s+["'](?P<source>[^"'\n]+)["']"#,
                DependencyKind::Import,
                starts_relative,
            ),
            dep(
                r#"\bimport\s*\(\s*["'](?P<source>[^"'\n]+)["']\s*\)"#,
                DependencyKind::Import,
                starts_relative,
            ),
            dep(
                r#"\brequire\s*\(\s*["'](?P<source>[^"'\n]+)["']\s*\)"#,
                DependencyKind::Require,
                starts_relative,
            ),
        ],
        export_patterns: vec![
            default_export(
                r"(?m)^\s*export\s+default\s+(?:async\s+)?function\s*\*?\s*(?P<name>[\w$]+)",
                ExportType::Function,
            ),
            default_export(
                r"(?m)^\s*export\s+default\s+(?:abstract\s+)?class\s+(?P<name>[\w$]+)",
                ExportType::Class,
            ),
            default_export(
                r"(?m)^\s*export\s+default\s+(?P<name>[A-Za-z_$][\w$]*)\s*;?\s*$",
                ExportType::Variable,
            ),
            export(
                r"(?m)^\s*export\s+(?:declare\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>[\w$]+)",
                ExportType::Function,
            ),
            export(
                r"(?m)^\s*export\s+(?:declare\s+)?(?:abstract\s+)?class\s+(?P<name>[\w$]+)",
                ExportType::Class,
            ),
            export(
                r"(?m)^\s*export\s+(?:declare\s+)?(?:const|let|var)\s+(?P<name>[\w$]+)",
                ExportType::Variable,
            ),
            export(
                r"(?m)^\s*export\s+(?:declare\s+)?(?:interface|type)\s+(?P<name>[\w$]+)",
                ExportType::Type,
            ),
            export(
                r"(?m)^\s*export\s+(?:declare\s+)?(?:const\s+)?enum\s+(?P<name>[\w$]+)",
                ExportType::Enum,
            ),
        ],
        comment_pattern: re(C_STYLE_COMMENTS),
        function_patterns: vec![
            re(r"(?m)^(?P<indent>[ \t]*)(?:export\s+)?(?:default\s+)?(?P<async>async\s+)?function\s*\*?\s*(?P<name>[\w$]+)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)\)"),
            re(r"(?m)^(?P<indent>[ \t]*)(?:export\s+)?(?:const|let|var)\s+(?P<name>[\w$]+)\s*(?::[^=\n]+)?=\s*(?P<async>async\s+)?\((?P<params>[^)]*)\)\s*(?::[^=\n]+)?=>"),
        ],
        class_pattern: Some(re(
            r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?P<kind>class|interface|enum)\s+(?P<name>[\w$]+)(?P<heritage>[^{\n]*)",
        )),
        block_style: BlockStyle::Braces,
        locality: js_locality,
        resolver: Some(Resolver {
            normalize: identity,
            candidates,
        }),
        reexports: true,
    }
}

fn python() -> LanguageConfig {
    LanguageConfig {
        language: "python",
        dependency_patterns: vec![
            dep_split(
                r"(?m)^[ \t]*import\s+(?P<source>[\w.]+(?:\s+as\s+\w+)?(?:\s*,\s*[\w.]+(?:\s+as\s+\w+)?)*)",
                DependencyKind::Import,
                SourceSplit::Commas,
                starts_with_dot,
            ),
            dep(
                r"(?m)^[ \t]*from\s+(?P<source>\.*[\w.]*)\s+import\b",
                DependencyKind::Import,
                starts_with_dot,
            ),
        ],
        export_patterns: vec![
            export(r"(?m)^(?:async\s+)?def\s+(?P<name>[A-Za-z]\w*)", ExportType::Function),
            export(r"(?m)^class\s+(?P<name>[A-Za-z]\w*)", ExportType::Class),
            export(
                r"(?m)^(?P<name>[A-Z][A-Z0-9_]*)\s*(?::[^=\n]+)?=[^=]",
                ExportType::Variable,
            ),
        ],
        comment_pattern: re(r"#[^\n]*"),
        function_patterns: vec![re(
            r"(?m)^(?P<indent>[ \t]*)(?P<async>async\s+)?def\s+(?P<name>\w+)\s*\((?P<params>[^)]*)\)",
        )],
        class_pattern: Some(re(
            r"(?m)^(?P<indent>[ \t]*)(?P<kind>class)\s+(?P<name>\w+)\s*(?:\((?P<heritage>[^)]*)\))?",
        )),
        block_style: BlockStyle::Indent,
        locality: dot_locality,
        resolver: Some(Resolver {
            normalize: python_module,
            candidates: PYTHON_CANDIDATES,
        }),
        reexports: false,
    }
}

fn go() -> LanguageConfig {
    LanguageConfig {
        language: "go",
        dependency_patterns: vec![
            dep(
                r#"(?m)^\s*import\s+(?:[\w.]+\s+)?"(?P<source>[^"]+)""#,
                DependencyKind::Import,
                starts_with_dot,
            ),
            dep_split(
                r"(?m)^\s*import\s*\((?P<source>[^)]*)\)",
                DependencyKind::Import,
                SourceSplit::QuotedStrings,
                starts_with_dot,
            ),
        ],
        export_patterns: vec![
            export(
                r"(?m)^func\s+(?:\([^)]*\)\s*)?(?P<name>[A-Z]\w*)",
                ExportType::Function,
            ),
            export(r"(?m)^type\s+(?P<name>[A-Z]\w*)\s+struct\b", ExportType::Class),
            export(r"(?m)^type\s+(?P<name>[A-Z]\w*)\s+interface\b", ExportType::Type),
            export(r"(?m)^(?:const|var)\s+(?P<name>[A-Z]\w*)", ExportType::Variable),
        ],
        comment_pattern: re(C_STYLE_COMMENTS),
        function_patterns: vec![re(
            r"(?m)^(?P<indent>)func\s+(?:\((?P<receiver>[^)]*)\)\s*)?(?P<name>\w+)\s*(?:\[[^\]]*\])?\((?P<params>[^)]*)\)",
        )],
        class_pattern: Some(re(r"(?m)^type\s+(?P<name>\w+)\s+(?P<kind>struct|interface)\b")),
        block_style: BlockStyle::Braces,
        locality: dot_locality,
        resolver: Some(Resolver {
            normalize: identity,
            candidates: GO_CANDIDATES,
        }),
        reexports: false,
    }
}

fn java() -> LanguageConfig {
    LanguageConfig {
        language: "java",
        dependency_patterns: vec![dep(
            r"(?m)^\s*import\s+(?:static\s+)?(?P<source>[\w.]+(?:\.\*)?)\s*;",
            DependencyKind::Import,
            never,
        )],
        export_patterns: vec![
            export(
                r"(?m)^\s*public\s+(?:(?:static|final|abstract|sealed)\s+)*(?:class|record)\s+(?P<name>\w+)",
                ExportType::Class,
            ),
            export(
                r"(?m)^\s*public\s+(?:(?:static|sealed|abstract)\s+)*@?interface\s+(?P<name>\w+)",
                ExportType::Type,
            ),
            export(
                r"(?m)^\s*public\s+(?:static\s+)?enum\s+(?P<name>\w+)",
                ExportType::Enum,
            ),
        ],
        comment_pattern: re(C_STYLE_COMMENTS),
        function_patterns: vec![re(
            r"(?m)^(?P<indent>[ \t]*)(?:(?:public|protected|private|static|final|abstract|synchronized|native|default)\s+)+(?:<[^>]+>\s+)?[\w<>\[\],.?]+(?:\s*<[^>]*>)?\s+(?P<name>\w+)\s*\((?P<params>[^)]*)\)",
        )],
        class_pattern: Some(re(
            r"(?m)^[ \t]*(?:(?:public|protected|private|static|final|abstract|sealed)\s+)*(?P<kind>class|interface|enum|record)\s+(?P<name>\w+)(?P<heritage>[^{\n]*)",
        )),
        block_style: BlockStyle::Braces,
        locality: never_local,
        resolver: None,
        reexports: false,
    }
}

fn rust() -> LanguageConfig {
    LanguageConfig {
        language: "rust",
        dependency_patterns: vec![
            dep(
                r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+(?P<source>[\w:]+)",
                DependencyKind::Use,
                rust_use_is_local,
            ),
            dep(
                r"(?m)^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+(?P<source>\w+)\s*;",
                DependencyKind::Include,
                always,
            ),
            dep(
                r"(?m)^\s*extern\s+crate\s+(?P<source>\w+)",
                DependencyKind::Use,
                never,
            ),
        ],
        export_patterns: vec![
            export(
                r"(?m)^pub\s+(?:async\s+)?(?:const\s+)?(?:unsafe\s+)?fn\s+(?P<name>\w+)",
                ExportType::Function,
            ),
            export(r"(?m)^pub\s+struct\s+(?P<name>\w+)", ExportType::Class),
            export(r"(?m)^pub\s+enum\s+(?P<name>\w+)", ExportType::Enum),
            export(r"(?m)^pub\s+(?:trait|type)\s+(?P<name>\w+)", ExportType::Type),
            export(r"(?m)^pub\s+(?:const|static)\s+(?P<name>\w+)", ExportType::Variable),
        ],
        comment_pattern: re(C_STYLE_COMMENTS),
        function_patterns: vec![re(
            r"(?m)^(?P<indent>[ \t]*)(?:pub(?:\([^)]*\))?\s+)?(?P<async>async\s+)?(?:const\s+)?(?:unsafe\s+)?fn\s+(?P<name>\w+)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)\)",
        )],
        class_pattern: Some(re(
            r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?(?P<kind>struct|enum|trait)\s+(?P<name>\w+)",
        )),
        block_style: BlockStyle::Braces,
        locality: rust_locality,
        resolver: Some(Resolver {
            normalize: rust_module,
            candidates: RUST_CANDIDATES,
        }),
        reexports: false,
    }
}

fn ruby() -> LanguageConfig {
    LanguageConfig {
        language: "ruby",
        dependency_patterns: vec![
            dep(
                r#"(?m)^\s*require_relative\s*\(?\s*["'](?P<source>[^"'\n]+)["']"#,
                DependencyKind::Require,
                always,
            ),
            dep(
                r#"(?m)^\s*(?:require|load)\s*\(?\s*["'](?P<source>[^"'\n]+)["']"#,
                DependencyKind::Require,
                starts_with_dot,
            ),
        ],
        export_patterns: vec![
            export(r"(?m)^(?:class|module)\s+(?P<name>[A-Z][\w:]*)", ExportType::Class),
            export(r"(?m)^def\s+(?:self\.)?(?P<name>\w+[?!=]?)", ExportType::Function),
        ],
        comment_pattern: re(r"#[^\n]*|(?ms:^=begin.*?^=end)"),
        function_patterns: vec![re(
            r"(?m)^(?P<indent>[ \t]*)def\s+(?:self\.)?(?P<name>\w+[?!=]?)(?:\s*\((?P<params>[^)]*)\))?",
        )],
        class_pattern: Some(re(
            r"(?m)^(?P<indent>[ \t]*)(?P<kind>class|module)\s+(?P<name>[A-Z][\w:]*)(?:\s*<\s*(?P<heritage>[\w:]+))?",
        )),
        block_style: BlockStyle::Indent,
        locality: dot_locality,
        resolver: Some(Resolver {
            normalize: identity,
            candidates: RUBY_CANDIDATES,
        }),
        reexports: false,
    }
}

fn php() -> LanguageConfig {
    LanguageConfig {
        language: "php",
        dependency_patterns: vec![
            dep(
                r#"\b(?:require|include)(?:_once)?\s*\(?\s*["'](?P<source>[^"'\n]+)["']"#,
                DependencyKind::Include,
                php_include_is_local,
            ),
            dep(
                r"(?m)^\s*use\s+(?:function\s+|const\s+)?(?P<source>[\w\\]+)",
                DependencyKind::Use,
                never,
            ),
        ],
        export_patterns: vec![
            export(
                r"(?m)^\s*(?:(?:abstract|final|readonly)\s+)*class\s+(?P<name>\w+)",
                ExportType::Class,
            ),
            export(r"(?m)^\s*(?:interface|trait)\s+(?P<name>\w+)", ExportType::Type),
            export(r"(?m)^\s*enum\s+(?P<name>\w+)", ExportType::Enum),
            export(r"(?m)^function\s+(?P<name>\w+)", ExportType::Function),
        ],
        comment_pattern: re(r"//[^\n]*|#[^\n]*|(?s:/\*.*?\*/)"),
        function_patterns: vec![re(
            r"(?m)^(?P<indent>[ \t]*)(?:(?:public|protected|private|static|abstract|final)\s+)*function\s+(?P<name>\w+)\s*\((?P<params>[^)]*)\)",
        )],
        class_pattern: Some(re(
            r"(?m)^[ \t]*(?:(?:abstract|final|readonly)\s+)*(?P<kind>class|interface|trait|enum)\s+(?P<name>\w+)(?P<heritage>[^{\n]*)",
        )),
        block_style: BlockStyle::Braces,
        locality: php_locality,
        resolver: Some(Resolver {
            normalize: identity,
            candidates: AS_IS,
        }),
        reexports: false,
    }
}

fn csharp() -> LanguageConfig {
    LanguageConfig {
        language: "csharp",
        dependency_patterns: vec![dep(
            r"(?m)^\s*(?:global\s+)?using\s+(?:static\s+)?(?:\w+\s*=\s*)?(?P<source>[\w.]+)\s*;",
            DependencyKind::Use,
            never,
        )],
        export_patterns: vec![
            export(
                r"(?m)^\s*public\s+(?:(?:static|sealed|abstract|partial|readonly)\s+)*(?:class|record|struct)\s+(?P<name>\w+)",
                ExportType::Class,
            ),
            export(
                r"(?m)^\s*public\s+(?:partial\s+)?interface\s+(?P<name>\w+)",
                ExportType::Type,
            ),
            export(r"(?m)^\s*public\s+enum\s+(?P<name>\w+)", ExportType::Enum),
        ],
        comment_pattern: re(C_STYLE_COMMENTS),
        function_patterns: vec![re(
            r"(?m)^(?P<indent>[ \t]*)(?:(?:public|private|protected|internal|static|virtual|override|abstract|sealed|extern|unsafe|new)\s+)*(?P<async>async\s+)?[\w<>\[\],.?]+\s+(?P<name>[A-Z]\w*)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)\)\s*(?:\{|=>|$)",
        )],
        class_pattern: Some(re(
            r"(?m)^[ \t]*(?:(?:public|private|protected|internal|static|sealed|abstract|partial)\s+)*(?P<kind>class|interface|struct|enum|record)\s+(?P<name>\w+)(?P<heritage>[^{\n]*)",
        )),
        block_style: BlockStyle::Braces,
        locality: never_local,
        resolver: None,
        reexports: false,
    }
}

fn kotlin() -> LanguageConfig {
    LanguageConfig {
        language: "kotlin",
        dependency_patterns: vec![dep(
            r"(?m)^\s*import\s+(?P<source>[\w.]+(?:\.\*)?)",
            DependencyKind::Import,
            never,
        )],
        export_patterns: vec![
            export(
                r"(?m)^(?:(?:public|internal|open|data|sealed|abstract|inline|value|annotation)\s+)*(?:class|object)\s+(?P<name>\w+)",
                ExportType::Class,
            ),
            export(
                r"(?m)^(?:(?:public|internal|sealed|fun)\s+)*interface\s+(?P<name>\w+)",
                ExportType::Type,
            ),
            export(
                r"(?m)^(?:(?:public|internal)\s+)?enum\s+class\s+(?P<name>\w+)",
                ExportType::Enum,
            ),
            export(
                r"(?m)^(?:(?:public|internal|inline|suspend|operator|infix)\s+)*fun\s+(?:<[^>]*>\s*)?(?:[\w.]+\.)?(?P<name>\w+)",
                ExportType::Function,
            ),
        ],
        comment_pattern: re(C_STYLE_COMMENTS),
        function_patterns: vec![re(
            r"(?m)^(?P<indent>[ \t]*)(?:(?:public|private|internal|protected|open|override|inline|operator|infix|tailrec)\s+)*(?P<async>suspend\s+)?fun\s+(?:<[^>]*>\s*)?(?:[\w.]+\.)?(?P<name>\w+)\s*\((?P<params>[^)]*)\)",
        )],
        class_pattern: Some(re(
            r"(?m)^[ \t]*(?:(?:public|private|internal|protected|open|data|sealed|abstract|enum|inner|value|annotation)\s+)*(?P<kind>class|interface|object)\s+(?P<name>\w+)(?P<heritage>[^{\n]*)",
        )),
        block_style: BlockStyle::Braces,
        locality: never_local,
        resolver: None,
        reexports: false,
    }
}

fn swift() -> LanguageConfig {
    LanguageConfig {
        language: "swift",
        dependency_patterns: vec![dep(
            r"(?m)^\s*(?:@testable\s+)?import\s+(?:(?:class|struct|enum|protocol|func|var|let|typealias)\s+)?(?P<source>[\w.]+)",
            DependencyKind::Import,
            never,
        )],
        export_patterns: vec![
            export(
                r"(?m)^\s*(?:public|open)\s+(?:final\s+)?(?:class|struct|actor)\s+(?P<name>\w+)",
                ExportType::Class,
            ),
            export(r"(?m)^\s*(?:public|open)\s+protocol\s+(?P<name>\w+)", ExportType::Type),
            export(r"(?m)^\s*(?:public|open)\s+enum\s+(?P<name>\w+)", ExportType::Enum),
            export(r"(?m)^(?:public|open)\s+func\s+(?P<name>\w+)", ExportType::Function),
        ],
        comment_pattern: re(C_STYLE_COMMENTS),
        function_patterns: vec![re(
            r"(?m)^(?P<indent>[ \t]*)(?:(?:public|private|internal|fileprivate|open|static|class|override|mutating|final|@\w+)\s+)*func\s+(?P<name>\w+)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)\)",
        )],
        class_pattern: Some(re(
            r"(?m)^[ \t]*(?:(?:public|private|internal|fileprivate|open|final)\s+)*(?P<kind>class|struct|enum|protocol|actor|extension)\s+(?P<name>\w+)(?P<heritage>[^{\n]*)",
        )),
        block_style: BlockStyle::Braces,
        locality: never_local,
        resolver: None,
        reexports: false,
    }
}

fn scala() -> LanguageConfig {
    LanguageConfig {
        language: "scala",
        dependency_patterns: vec![dep(
            r"(?m)^\s*import\s+(?P<source>[\w.]+(?:\.\{[^}]*\}|\._|\.\*)?)",
            DependencyKind::Import,
            never,
        )],
        export_patterns: vec![
            export(
                r"(?m)^(?:(?:final|sealed|abstract|case|implicit)\s+)*(?:class|object)\s+(?P<name>\w+)",
                ExportType::Class,
            ),
            export(r"(?m)^(?:sealed\s+)?trait\s+(?P<name>\w+)", ExportType::Type),
        ],
        comment_pattern: re(C_STYLE_COMMENTS),
        function_patterns: vec![re(
            r"(?m)^(?P<indent>[ \t]*)(?:(?:override|private|protected|final|implicit)\s+)*def\s+(?P<name>\w+)\s*(?:\[[^\]]*\])?\s*(?:\((?P<params>[^)]*)\))?",
        )],
        class_pattern: Some(re(
            r"(?m)^[ \t]*(?:(?:final|sealed|abstract|case|implicit|private)\s+)*(?P<kind>class|object|trait)\s+(?P<name>\w+)(?P<heritage>[^{\n]*)",
        )),
        block_style: BlockStyle::Braces,
        locality: never_local,
        resolver: None,
        reexports: false,
    }
}

const C_FUNCTION: &str = r"(?m)^(?P<indent>[ \t]*)(?P<decl>(?:[A-Za-z_][\w:<>,\*&]*[ \t\*&]+)+)(?P<name>[A-Za-z_][\w:~]*)\s*\((?P<params>[^;{)]*)\)\s*(?:const\s*)?(?:override\s*)?\{";

fn c_family(language: &'static str, class_pattern: &str, type_export: &str) -> LanguageConfig {
    LanguageConfig {
        language,
        dependency_patterns: vec![
            dep(
                r#"(?m)^\s*#\s*include\s*"(?P<source>[^"]+)""#,
                DependencyKind::Include,
                always,
            ),
            dep(
                r"(?m)^\s*#\s*include\s*<(?P<source>[^>]+)>",
                DependencyKind::Include,
                never,
            ),
        ],
        export_patterns: vec![
            export_if(
                r"(?m)^[A-Za-z_][\w \t\*&:<>,]*?[ \t\*&]+(?P<name>[A-Za-z_][\w:]*)\s*\([^;{)]*\)\s*(?:const\s*)?\{",
                ExportType::Function,
                c_function_is_exported,
            ),
            export(type_export, ExportType::Class),
        ],
        comment_pattern: re(C_STYLE_COMMENTS),
        function_patterns: vec![re(C_FUNCTION)],
        class_pattern: Some(re(class_pattern)),
        block_style: BlockStyle::Braces,
        locality: c_locality,
        resolver: Some(Resolver {
            normalize: identity,
            candidates: AS_IS,
        }),
        reexports: false,
    }
}

lazy_static! {
    pub(crate) static ref CONFIGS: Vec<LanguageConfig> = vec![
        js_family("typescript", TS_CANDIDATES),
        js_family("javascript", JS_CANDIDATES),
        python(),
        go(),
        java(),
        rust(),
        ruby(),
        php(),
        csharp(),
        kotlin(),
        swift(),
        scala(),
        c_family(
            "cpp",
            r"(?m)^[ \t]*(?:template\s*<[^>]*>\s*)?(?P<kind>class|struct|enum|namespace)(?:\s+class)?\s+(?P<name>\w+)(?P<heritage>[^;{\n]*)\{",
            r"(?m)^(?:template\s*<[^>]*>\s*)?(?:class|struct)\s+(?P<name>\w+)[^;{\n]*\{",
        ),
        c_family(
            "c",
            r"(?m)^[ \t]*(?:typedef\s+)?(?P<kind>struct|enum|union)\s+(?P<name>\w+)\s*\{",
            r"(?m)^(?:typedef\s+)?struct\s+(?P<name>\w+)\s*\{",
        ),
    ];
}
