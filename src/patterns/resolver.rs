//! Module-path resolution against the file system.
//!
//! A resolver normalizes an import source into a path relative to the
//! importing file's directory, then probes a fixed, ordered list of
//! candidates. The first candidate that exists wins; nothing outside the
//! list is ever tried, and no path is returned unless it exists.

use std::path::{Component, Path, PathBuf};

use crate::analysis::DependencyKind;

/// One on-disk candidate derived from a normalized source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// The source itself.
    AsIs,
    /// The source itself, only when it already carries an extension.
    AsIsWithExtension,
    /// The source with a suffix appended (`./x` -> `./x.ts`).
    Append(&'static str),
    /// The source with one extension swapped for another (`./x.js` -> `./x.ts`).
    ReplaceExtension {
        from: &'static str,
        to: &'static str,
    },
    /// A file inside the source treated as a directory (`./x` -> `./x/index.ts`).
    Join(&'static str),
    /// The source as a directory.
    Directory,
}

impl Candidate {
    fn apply(&self, normalized: &str) -> Option<String> {
        match self {
            Candidate::AsIs | Candidate::Directory => Some(normalized.to_string()),
            Candidate::AsIsWithExtension => Path::new(normalized)
                .extension()
                .map(|_| normalized.to_string()),
            Candidate::Append(suffix) => Some(format!("{}{}", normalized, suffix)),
            Candidate::ReplaceExtension { from, to } => normalized
                .strip_suffix(from)
                .map(|stem| format!("{}{}", stem, to)),
            Candidate::Join(name) => Some(format!("{}/{}", normalized.trim_end_matches('/'), name)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        match self {
            Candidate::Directory => path.is_dir(),
            _ => path.is_file(),
        }
    }
}

/// Language-specific resolver.
#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    /// Maps a dependency source to a relative path, or `None` when the
    /// dependency kind is never resolved.
    pub normalize: fn(&str, DependencyKind) -> Option<String>,
    pub candidates: &'static [Candidate],
}

impl Resolver {
    /// Resolve a dependency of `file_path`. Returns the first existing candidate.
    pub fn resolve(&self, file_path: &Path, source: &str, kind: DependencyKind) -> Option<String> {
        let normalized = (self.normalize)(source, kind)?;
        let base_dir = file_path.parent().unwrap_or_else(|| Path::new(""));

        self.candidates.iter().find_map(|candidate| {
            let relative = candidate.apply(&normalized)?;
            let path = normalize_path(&base_dir.join(relative));
            if candidate.exists(&path) {
                Some(path.to_string_lossy().into_owned())
            } else {
                None
            }
        })
    }
}

/// Source used unchanged.
pub fn identity(source: &str, _kind: DependencyKind) -> Option<String> {
    Some(source.to_string())
}

/// Python relative module (`..pkg.mod`) to a path (`../pkg/mod`).
pub fn python_module(source: &str, _kind: DependencyKind) -> Option<String> {
    let dots = source.chars().take_while(|c| *c == '.').count();
    if dots == 0 {
        return None;
    }
    let prefix = if dots == 1 {
        ".".to_string()
    } else {
        vec![".."; dots - 1].join("/")
    };
    let rest = source[dots..].replace('.', "/");
    if rest.is_empty() {
        Some(prefix)
    } else {
        Some(format!("{}/{}", prefix, rest))
    }
}

/// Rust `mod name;` declarations; `use` paths are never resolved.
pub fn rust_module(source: &str, kind: DependencyKind) -> Option<String> {
    match kind {
        DependencyKind::Include => Some(source.to_string()),
        _ => None,
    }
}

/// Lexically normalize a path, folding `.` and `..` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const TS_CANDIDATES: &[Candidate] = &[
        Candidate::AsIsWithExtension,
        Candidate::ReplaceExtension { from: ".js", to: ".ts" },
        Candidate::Append(".ts"),
        Candidate::Join("index.ts"),
    ];

    fn ts_resolver() -> Resolver {
        Resolver {
            normalize: identity,
            candidates: TS_CANDIDATES,
        }
    }

    #[test]
    fn test_js_import_retries_as_ts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("util.ts"), "export const x = 1;").unwrap();
        let file = dir.path().join("main.ts");

        let resolved = ts_resolver()
            .resolve(&file, "./util.js", DependencyKind::Import)
            .unwrap();
        assert_eq!(Path::new(&resolved), dir.path().join("util.ts"));
    }

    #[test]
    fn test_extensionless_import_tries_index() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/index.ts"), "").unwrap();
        let file = dir.path().join("main.ts");

        let resolved = ts_resolver()
            .resolve(&file, "./lib", DependencyKind::Import)
            .unwrap();
        assert_eq!(Path::new(&resolved), dir.path().join("lib/index.ts"));
    }

    #[test]
    fn test_missing_candidates_leave_unresolved() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("main.ts");
        assert!(ts_resolver()
            .resolve(&file, "./missing", DependencyKind::Import)
            .is_none());
    }

    #[test]
    fn test_python_module_normalization() {
        assert_eq!(python_module(".models", DependencyKind::Import).as_deref(), Some("./models"));
        assert_eq!(python_module("..pkg.util", DependencyKind::Import).as_deref(), Some("../pkg/util"));
        assert_eq!(python_module(".", DependencyKind::Import).as_deref(), Some("."));
        assert_eq!(python_module("os.path", DependencyKind::Import), None);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
    }
}
