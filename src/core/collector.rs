use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

use super::extractor::SymbolExtractor;

/// Enumerates analyzable files under a root, honoring an exclusion set.
///
/// Excluded directories are pruned entirely rather than descended into, and
/// hidden directories are skipped by convention. A directory that cannot be
/// listed is skipped silently; collection never aborts on one bad entry.
pub struct FileCollector {
    excluded_dirs: HashSet<String>,
}

impl FileCollector {
    pub fn new(excluded_dirs: &[String]) -> Self {
        Self {
            excluded_dirs: excluded_dirs.iter().cloned().collect(),
        }
    }

    /// True when any component of a repo-relative path names an excluded or
    /// hidden directory. Such paths are never collected, so changed-path
    /// notifications for them must be rejected too.
    pub fn is_excluded(&self, path: &Path) -> bool {
        path.components().any(|c| match c {
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                name.starts_with('.') || self.excluded_dirs.contains(name.as_ref())
            }
            _ => false,
        })
    }

    /// Collect repo-relative paths of supported files under `root`, sorted.
    pub fn collect(&self, root: &Path, extractor: &SymbolExtractor) -> Vec<PathBuf> {
        let excluded = self.excluded_dirs.clone();

        let walker = WalkBuilder::new(root)
            .git_ignore(true)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map_or(false, |t| t.is_dir());
                if !is_dir {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !excluded.contains(name.as_ref())
            })
            .build();

        let mut paths = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() || !extractor.supports_path(path) {
                continue;
            }

            match path.strip_prefix(root) {
                Ok(rel) => paths.push(rel.to_path_buf()),
                Err(_) => continue,
            }
        }

        paths.sort();
        paths
    }
}
