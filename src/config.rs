use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ArchscopeError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Source analysis configuration
    pub analysis: AnalysisConfig,

    /// Diagram projection settings
    pub diagrams: DiagramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Root directory to analyze
    pub root: PathBuf,

    /// Directory names pruned entirely during collection
    pub excluded_dirs: Vec<String>,

    /// Output directory for model and diagram snapshots
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Languages to extract symbols for
    pub languages: Vec<String>,

    /// Maximum file size to read (in bytes)
    pub max_file_size: usize,

    /// Hard ceiling on total model size; a full pass above this is rejected
    pub max_files: usize,

    /// Largest change set still handled incrementally
    pub incremental_threshold: usize,

    /// Bound on concurrent per-file extraction tasks
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramConfig {
    /// Display ceiling for graph views; above this, files are grouped by prefix
    pub max_graph_nodes: usize,

    /// Top-N domains shown in the domain diagram
    pub max_domains: usize,

    /// Direct dependencies traced per flow diagram
    pub flow_fanout: usize,

    /// Maximum number of flow diagrams emitted
    pub max_flows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig {
                name: "Unnamed Project".to_string(),
                root: PathBuf::from("."),
                excluded_dirs: default_excluded_dirs(),
                output_dir: PathBuf::from(".archscope"),
            },
            analysis: AnalysisConfig {
                languages: vec![
                    "typescript".to_string(),
                    "javascript".to_string(),
                    "python".to_string(),
                    "go".to_string(),
                    "rust".to_string(),
                ],
                max_file_size: 1024 * 1024, // 1MB
                max_files: 10_000,
                incremental_threshold: 20,
                concurrency: 8,
            },
            diagrams: DiagramConfig {
                max_graph_nodes: 200,
                max_domains: 12,
                flow_fanout: 3,
                max_flows: 6,
            },
        }
    }
}

/// Directory names that are never descended into: dependency installs,
/// version-control metadata, build output, caches, and the tool's own
/// output directory.
pub fn default_excluded_dirs() -> Vec<String> {
    [
        "node_modules",
        ".git",
        ".hg",
        ".svn",
        "target",
        "dist",
        "build",
        "out",
        ".next",
        ".venv",
        "venv",
        "__pycache__",
        ".cache",
        "coverage",
        "vendor",
        ".archscope",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ArchscopeError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ArchscopeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                // Try common config file locations
                let candidates = [
                    "Archscope.toml",
                    "archscope.toml",
                    ".archscope.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.analysis.max_files, config.analysis.max_files);
        assert_eq!(parsed.diagrams.max_graph_nodes, 200);
        assert_eq!(parsed.analysis.incremental_threshold, 20);
    }

    #[test]
    fn test_output_dir_is_excluded_by_default() {
        let config = Config::default();
        assert!(config
            .project
            .excluded_dirs
            .contains(&".archscope".to_string()));
    }
}
