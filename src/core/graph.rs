use std::collections::{BTreeSet, HashSet};
use std::path::{Component, Path, PathBuf};

use super::model::{DependencyEdge, FileRecord};

/// Suffixes tried, in order, when resolving a relative import: the bare
/// path, each supported source extension, then the per-extension index-file
/// convention. First existing candidate wins.
const CANDIDATE_SUFFIXES: [&str; 14] = [
    "",
    ".ts",
    ".tsx",
    ".js",
    ".jsx",
    ".mjs",
    ".py",
    ".go",
    ".rs",
    "/index.ts",
    "/index.tsx",
    "/index.js",
    "/__init__.py",
    "/mod.rs",
];

/// Builds the dependency edge list by resolving each file's relative
/// imports against the current file set.
///
/// Non-relative imports and imports that resolve to no known file produce
/// no edge; that is the expected outcome for external packages, not an
/// error. The output is deterministic for a given file set: edges are
/// deduplicated and sorted.
pub struct DependencyGraphBuilder;

impl DependencyGraphBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, files: &[FileRecord]) -> Vec<DependencyEdge> {
        let known: HashSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();
        let mut edges = BTreeSet::new();

        for file in files {
            let base = file.path.parent().unwrap_or_else(|| Path::new(""));

            for import in &file.imports {
                if !import.is_relative {
                    continue;
                }
                if let Some(target) = resolve_relative(base, &import.source, &known) {
                    if target != file.path {
                        edges.insert(DependencyEdge {
                            source: file.path.clone(),
                            target,
                        });
                    }
                }
            }
        }

        edges.into_iter().collect()
    }
}

impl Default for DependencyGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve one relative import source against the importing file's
/// directory, trying each candidate suffix in order.
fn resolve_relative(base: &Path, source: &str, known: &HashSet<&Path>) -> Option<PathBuf> {
    let joined = base.join(source);
    let normalized = normalize(&joined)?;
    let normalized_str = normalized.to_string_lossy().to_string();

    for suffix in CANDIDATE_SUFFIXES {
        let candidate = PathBuf::from(format!("{}{}", normalized_str, suffix));
        if known.contains(candidate.as_path()) {
            return Some(candidate);
        }
    }

    None
}

/// Collapse `.` and `..` components. An import escaping above the repo
/// root is unresolvable.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut parts: Vec<String> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(parts.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ImportRecord, Language};

    fn record(path: &str, imports: Vec<(&str, bool)>) -> FileRecord {
        FileRecord {
            path: PathBuf::from(path),
            language: Language::TypeScript,
            imports: imports
                .into_iter()
                .map(|(source, is_relative)| ImportRecord {
                    source: source.to_string(),
                    specifiers: vec![],
                    is_relative,
                })
                .collect(),
            exports: vec![],
            functions: vec![],
            classes: vec![],
        }
    }

    #[test]
    fn test_relative_import_resolves_to_existing_file() {
        let files = vec![
            record("src/index.ts", vec![("./utils", true), ("./missing", true)]),
            record("src/utils.ts", vec![]),
        ];

        let edges = DependencyGraphBuilder::new().build(&files);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, PathBuf::from("src/index.ts"));
        assert_eq!(edges[0].target, PathBuf::from("src/utils.ts"));
    }

    #[test]
    fn test_external_imports_produce_no_edge() {
        let files = vec![
            record("src/index.ts", vec![("express", false), ("lodash", false)]),
            record("src/express.ts", vec![]),
        ];

        let edges = DependencyGraphBuilder::new().build(&files);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_index_file_convention() {
        let files = vec![
            record("src/app.ts", vec![("./auth", true)]),
            record("src/auth/index.ts", vec![]),
        ];

        let edges = DependencyGraphBuilder::new().build(&files);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, PathBuf::from("src/auth/index.ts"));
    }

    #[test]
    fn test_mod_rs_convention_for_rust() {
        let files = vec![
            record("src/lib.rs", vec![("./core", true)]),
            record("src/core/mod.rs", vec![]),
        ];

        let edges = DependencyGraphBuilder::new().build(&files);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, PathBuf::from("src/core/mod.rs"));
    }

    #[test]
    fn test_parent_traversal_and_root_escape() {
        let files = vec![
            record("src/api/routes.ts", vec![("../models/user", true), ("../../../etc", true)]),
            record("src/models/user.ts", vec![]),
        ];

        let edges = DependencyGraphBuilder::new().build(&files);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, PathBuf::from("src/models/user.ts"));
    }

    #[test]
    fn test_edges_never_dangle() {
        let files = vec![
            record("a.ts", vec![("./b", true), ("./c", true)]),
            record("b.ts", vec![]),
        ];

        let edges = DependencyGraphBuilder::new().build(&files);
        let known: Vec<&Path> = files.iter().map(|f| f.path.as_path()).collect();
        for edge in &edges {
            assert!(known.contains(&edge.source.as_path()));
            assert!(known.contains(&edge.target.as_path()));
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let files = vec![
            record("src/index.ts", vec![("./utils", true)]),
            record("src/utils.ts", vec![("./index", true)]),
        ];

        let builder = DependencyGraphBuilder::new();
        let first = builder.build(&files);
        let second = builder.build(&files);
        assert_eq!(first, second);
    }
}
