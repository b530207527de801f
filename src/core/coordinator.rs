use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::classifier::Classifier;
use super::collector::FileCollector;
use super::diagrams::{DiagramRecord, DiagramSet};
use super::extractor::SymbolExtractor;
use super::graph::DependencyGraphBuilder;
use super::model::{CodebaseModel, FileRecord};
use super::projector::DiagramProjector;
use crate::config::Config;
use crate::error::{ArchscopeError, Result};

/// Which pipeline a pass ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    #[default]
    Full,
    Incremental,
}

/// Summary of one completed analysis pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub mode: AnalysisMode,
    pub files: usize,
    pub skipped: usize,
    pub duration_ms: u128,
}

/// Result of a change notification
#[derive(Debug)]
pub enum AnalysisOutcome {
    /// A pass ran (possibly more than one, draining coalesced batches);
    /// this is the last pass's report.
    Completed(AnalysisReport),

    /// A pass was already in flight; the change set was merged into its
    /// pending batch and will be picked up by exactly one follow-up pass.
    Coalesced,
}

#[derive(Debug, Default)]
struct PendingBatch {
    in_flight: bool,
    full: bool,
    paths: BTreeSet<PathBuf>,
}

/// Owns the live CodebaseModel and DiagramSet for one analyzed root and
/// runs the analysis pipeline over it.
///
/// Only one pass is ever in flight; changes arriving mid-pass coalesce into
/// a pending batch that triggers exactly one follow-up pass. The model is
/// replaced atomically after a pass completes, so readers never observe a
/// half-updated model.
pub struct AnalysisCoordinator {
    config: Config,
    root: PathBuf,
    collector: FileCollector,
    extractor: Arc<SymbolExtractor>,
    classifier: Classifier,
    graph_builder: DependencyGraphBuilder,
    projector: DiagramProjector,
    model: RwLock<CodebaseModel>,
    diagrams: RwLock<DiagramSet>,
    schedule: Mutex<PendingBatch>,
}

impl AnalysisCoordinator {
    pub fn new(config: Config) -> Self {
        let root = config.project.root.clone();
        let collector = FileCollector::new(&config.project.excluded_dirs);
        let extractor = Arc::new(SymbolExtractor::new(&config.analysis.languages));
        let projector = DiagramProjector::new(&config.diagrams);

        Self {
            config,
            root,
            collector,
            extractor,
            classifier: Classifier::new(),
            graph_builder: DependencyGraphBuilder::new(),
            projector,
            model: RwLock::new(CodebaseModel::empty()),
            diagrams: RwLock::new(DiagramSet::empty()),
            schedule: Mutex::new(PendingBatch::default()),
        }
    }

    /// Run a full analysis pass over the root
    pub async fn analyze(&self) -> Result<AnalysisOutcome> {
        self.notify_changes(Vec::new()).await
    }

    /// Notify the coordinator of changed paths (repo-relative).
    ///
    /// An empty change set requests a full pass. A non-empty set at or
    /// under the incremental threshold runs the incremental pipeline; a
    /// larger one falls back to full. If a pass is already in flight the
    /// set is merged into the pending batch instead of starting a second
    /// concurrent pass.
    pub async fn notify_changes(&self, changed: Vec<PathBuf>) -> Result<AnalysisOutcome> {
        {
            let mut pending = self.schedule.lock().await;
            if changed.is_empty() {
                pending.full = true;
            } else {
                pending.paths.extend(changed);
            }
            if pending.in_flight {
                debug!("Analysis in flight; change set merged into pending batch");
                return Ok(AnalysisOutcome::Coalesced);
            }
            pending.in_flight = true;
        }

        let mut last = AnalysisReport::default();
        loop {
            let (full, paths) = {
                let mut pending = self.schedule.lock().await;
                if !pending.full && pending.paths.is_empty() {
                    pending.in_flight = false;
                    break;
                }
                let full = pending.full
                    || pending.paths.len() > self.config.analysis.incremental_threshold;
                pending.full = false;
                (full, std::mem::take(&mut pending.paths))
            };

            let result = if full {
                self.run_full().await
            } else {
                self.run_incremental(&paths).await
            };

            match result {
                Ok(report) => last = report,
                Err(e) => {
                    // A batch queued during a failed pass still gets its
                    // promised follow-up pass; bail out only when nothing
                    // more is pending.
                    let mut pending = self.schedule.lock().await;
                    if !pending.full && pending.paths.is_empty() {
                        pending.in_flight = false;
                        return Err(e);
                    }
                    warn!("Analysis pass failed, continuing with pending batch: {}", e);
                }
            }
        }

        Ok(AnalysisOutcome::Completed(last))
    }

    /// Full pipeline: collect every file, extract in parallel, rebuild the
    /// whole model. Rejected outright when the file count exceeds the
    /// ceiling; an oversized model is evidence of mis-detection, not a
    /// valid state.
    async fn run_full(&self) -> Result<AnalysisReport> {
        let started = Instant::now();

        if !self.root.is_dir() {
            return Err(ArchscopeError::ModelIntegrity(format!(
                "analysis root {} is not a readable directory",
                self.root.display()
            )));
        }

        let paths = self.collector.collect(&self.root, &self.extractor);

        if paths.len() > self.config.analysis.max_files {
            warn!(
                "Rejecting analysis: {} files exceeds ceiling of {}; previous model kept",
                paths.len(),
                self.config.analysis.max_files
            );
            return Err(ArchscopeError::ModelIntegrity(format!(
                "file count {} exceeds ceiling {}",
                paths.len(),
                self.config.analysis.max_files
            )));
        }

        let total = paths.len();
        let semaphore = Arc::new(Semaphore::new(self.config.analysis.concurrency.max(1)));
        let max_file_size = self.config.analysis.max_file_size;
        let mut join_set = JoinSet::new();

        for path in paths {
            let extractor = Arc::clone(&self.extractor);
            let semaphore = Arc::clone(&semaphore);
            let abs = self.root.join(&path);

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                let content = tokio::fs::read_to_string(&abs).await.ok()?;
                if content.len() > max_file_size {
                    return None;
                }
                Some(extractor.extract(&path, &content))
            });
        }

        let mut records = Vec::with_capacity(total);
        let mut skipped = 0usize;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Some(record)) => records.push(record),
                _ => skipped += 1,
            }
        }

        // Fan-in order is nondeterministic; the model is not
        records.sort_by(|a, b| a.path.cmp(&b.path));

        let model = self.assemble(records);
        let files = model.files.len();
        self.publish(model).await;

        let report = AnalysisReport {
            mode: AnalysisMode::Full,
            files,
            skipped,
            duration_ms: started.elapsed().as_millis(),
        };
        info!(
            "Full analysis complete: {} files ({} skipped) in {}ms",
            report.files, report.skipped, report.duration_ms
        );
        Ok(report)
    }

    /// Incremental pipeline: re-extract only the changed paths, merge them
    /// into the live file set, then recompute the whole-model steps (edges
    /// and domains can shift anywhere when one file changes).
    async fn run_incremental(&self, changed: &BTreeSet<PathBuf>) -> Result<AnalysisReport> {
        let started = Instant::now();

        let mut by_path: BTreeMap<PathBuf, FileRecord> = {
            let model = self.model.read().await;
            model
                .files
                .iter()
                .map(|f| (f.path.clone(), f.clone()))
                .collect()
        };

        let mut skipped = 0usize;
        for path in changed {
            let abs = self.root.join(path);

            if !abs.is_file()
                || self.collector.is_excluded(path)
                || !self.extractor.supports_path(path)
            {
                // Deleted, excluded, or no longer a supported file; a full
                // pass would never collect it, so the merge drops it too
                by_path.remove(path);
                continue;
            }

            match tokio::fs::read_to_string(&abs).await {
                Ok(content) if content.len() <= self.config.analysis.max_file_size => {
                    by_path.insert(path.clone(), self.extractor.extract(path, &content));
                }
                _ => {
                    debug!("Skipping unreadable or oversized file: {}", path.display());
                    skipped += 1;
                }
            }
        }

        let records: Vec<FileRecord> = by_path.into_values().collect();
        let model = self.assemble(records);
        let files = model.files.len();
        self.publish(model).await;

        let report = AnalysisReport {
            mode: AnalysisMode::Incremental,
            files,
            skipped,
            duration_ms: started.elapsed().as_millis(),
        };
        info!(
            "Incremental analysis complete: {} changed paths, {} files in model, {}ms",
            changed.len(),
            report.files,
            report.duration_ms
        );
        Ok(report)
    }

    /// Whole-model assembly: layer tags, domain groups, dependency edges
    fn assemble(&self, files: Vec<FileRecord>) -> CodebaseModel {
        let layers: BTreeMap<PathBuf, _> = files
            .iter()
            .map(|f| (f.path.clone(), self.classifier.layer_of(&f.path)))
            .collect();
        let domains = self.classifier.group_domains(&layers);
        let edges = self.graph_builder.build(&files);

        CodebaseModel {
            files,
            layers,
            domains,
            edges,
            generated_at: chrono::Utc::now(),
        }
    }

    /// Atomically replace the live model, then regenerate auto diagrams
    async fn publish(&self, model: CodebaseModel) {
        let autos = self.projector.project(&model);
        let summary = self.projector.summary(&model);

        *self.model.write().await = model;
        self.diagrams.write().await.replace_auto(autos, summary);
    }

    /// Snapshot of the current model
    pub async fn model_snapshot(&self) -> CodebaseModel {
        self.model.read().await.clone()
    }

    /// Snapshot of the current diagram set
    pub async fn diagram_set(&self) -> DiagramSet {
        self.diagrams.read().await.clone()
    }

    /// Merge an externally supplied diagram into the current set
    pub async fn merge_diagram(
        &self,
        diagram_type: &str,
        markup: &str,
        description: Option<&str>,
    ) -> Result<DiagramRecord> {
        self.diagrams
            .write()
            .await
            .merge(diagram_type, markup, description)
    }

    /// Remove a diagram by id
    pub async fn remove_diagram(&self, id: &str) -> Result<()> {
        self.diagrams.write().await.delete(id)
    }

    /// Persist the current model and diagram set under `dir`
    pub async fn save_snapshots(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;

        let model = self.model.read().await.clone();
        let diagrams = self.diagrams.read().await.clone();

        tokio::fs::write(dir.join("model.json"), serde_json::to_string_pretty(&model)?).await?;
        tokio::fs::write(
            dir.join("diagrams.json"),
            serde_json::to_string_pretty(&diagrams)?,
        )
        .await?;
        Ok(())
    }

    /// Restore model and diagram set previously written by `save_snapshots`.
    /// Returns false when no snapshot exists.
    pub async fn load_snapshots(&self, dir: &Path) -> Result<bool> {
        let model_path = dir.join("model.json");
        if !model_path.exists() {
            return Ok(false);
        }

        let model: CodebaseModel =
            serde_json::from_str(&tokio::fs::read_to_string(&model_path).await?)?;

        let diagrams_path = dir.join("diagrams.json");
        let diagrams = if diagrams_path.exists() {
            serde_json::from_str(&tokio::fs::read_to_string(&diagrams_path).await?)?
        } else {
            DiagramSet::empty()
        };

        *self.model.write().await = model;
        *self.diagrams.write().await = diagrams;
        Ok(true)
    }
}
