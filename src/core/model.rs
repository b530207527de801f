use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source language, inferred from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Python,
    Go,
    Rust,
}

impl Language {
    /// Infer the language from a file extension, if supported
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "tsx" => Some(Language::TypeScript),
            "js" | "jsx" | "mjs" => Some(Language::JavaScript),
            "py" => Some(Language::Python),
            "go" => Some(Language::Go),
            "rs" => Some(Language::Rust),
            _ => None,
        }
    }

    /// Infer the language from a file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Rust => "rust",
        }
    }
}

/// One import statement, normalized across languages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Import source as written (relative sources use `./`/`../` form)
    pub source: String,

    /// Imported names, when the surface form lists them
    pub specifiers: Vec<String>,

    /// True iff the source begins with a path-relative marker
    pub is_relative: bool,
}

/// Kind of an exported symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Function,
    Class,
    Variable,
    Default,
}

/// A symbol explicitly marked as externally visible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub name: String,
    pub kind: ExportKind,
}

/// A function declaration (named or bound-variable form)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,

    /// 1-based line of the declaration
    pub line: usize,

    pub params: Vec<String>,
    pub is_async: bool,
    pub is_exported: bool,
}

/// A named class declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    pub line: usize,
    pub is_exported: bool,
}

/// Everything extracted from one analyzable file. The repo-relative `path`
/// is the record's identity: re-analysis replaces the record wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub language: Language,
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<ExportRecord>,
    pub functions: Vec<FunctionRecord>,
    pub classes: Vec<ClassRecord>,
}

/// Coarse architectural role of a file, assigned by path heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Api,
    Service,
    Model,
    Ui,
    Util,
    Config,
    Test,
    Other,
}

/// Fixed display/priority order for layers. Layer diagram ordering and
/// dominant-layer tie-breaking both follow this order.
pub const LAYER_PRIORITY: [Layer; 8] = [
    Layer::Api,
    Layer::Service,
    Layer::Model,
    Layer::Ui,
    Layer::Util,
    Layer::Config,
    Layer::Test,
    Layer::Other,
];

impl Layer {
    pub fn name(&self) -> &'static str {
        match self {
            Layer::Api => "api",
            Layer::Service => "service",
            Layer::Model => "model",
            Layer::Ui => "ui",
            Layer::Util => "util",
            Layer::Config => "config",
            Layer::Test => "test",
            Layer::Other => "other",
        }
    }

    /// Position in the fixed priority order (lower = more prominent)
    pub fn priority_index(&self) -> usize {
        LAYER_PRIORITY
            .iter()
            .position(|l| l == self)
            .unwrap_or(LAYER_PRIORITY.len())
    }
}

/// A named feature-area grouping of files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainGroup {
    pub name: String,
    pub file_count: usize,

    /// Majority layer over member files, ties broken by layer priority
    pub dominant_layer: Layer,
}

/// A resolved relative-import edge between two files in the same model
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// The aggregate analysis result for one root. Replaced atomically after
/// each analysis cycle; downstream consumers never see a partial model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodebaseModel {
    /// File records, sorted by path
    pub files: Vec<FileRecord>,

    /// Layer tag per path
    pub layers: BTreeMap<PathBuf, Layer>,

    /// Domains with at least two member files, largest first
    pub domains: Vec<DomainGroup>,

    /// Resolved dependency edges, sorted and deduplicated
    pub edges: Vec<DependencyEdge>,

    pub generated_at: DateTime<Utc>,
}

impl CodebaseModel {
    pub fn empty() -> Self {
        Self {
            files: Vec::new(),
            layers: BTreeMap::new(),
            domains: Vec::new(),
            edges: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    pub fn file(&self, path: &Path) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn layer_of(&self, path: &Path) -> Layer {
        self.layers.get(path).copied().unwrap_or(Layer::Other)
    }

    /// File count per non-empty layer
    pub fn layer_counts(&self) -> BTreeMap<Layer, usize> {
        let mut counts = BTreeMap::new();
        for layer in self.layers.values() {
            *counts.entry(*layer).or_insert(0) += 1;
        }
        counts
    }

    /// Outgoing edges of one file, in edge order
    pub fn edges_from<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a DependencyEdge> {
        self.edges.iter().filter(move |e| e.source == path)
    }
}

impl Default for CodebaseModel {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("tsx"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("mjs"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("rs"), Some(Language::Rust));
        assert_eq!(Language::from_extension("md"), None);
    }

    #[test]
    fn test_layer_priority_order_is_stable() {
        assert_eq!(Layer::Api.priority_index(), 0);
        assert_eq!(Layer::Service.priority_index(), 1);
        assert!(Layer::Util.priority_index() > Layer::Ui.priority_index());
        assert_eq!(Layer::Other.priority_index(), 7);
    }

    #[test]
    fn test_layer_counts() {
        let mut model = CodebaseModel::empty();
        model.layers.insert(PathBuf::from("src/api/routes.ts"), Layer::Api);
        model.layers.insert(PathBuf::from("src/services/user.ts"), Layer::Service);
        model.layers.insert(PathBuf::from("src/services/auth.ts"), Layer::Service);

        let counts = model.layer_counts();
        assert_eq!(counts.get(&Layer::Api), Some(&1));
        assert_eq!(counts.get(&Layer::Service), Some(&2));
        assert_eq!(counts.get(&Layer::Ui), None);
    }
}
