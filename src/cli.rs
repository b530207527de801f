use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::core::{AnalysisCoordinator, AnalysisOutcome};

#[derive(Parser)]
#[command(name = "archscope")]
#[command(about = "Live architecture diagrams derived straight from your source tree")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default Archscope.toml
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Run a full analysis and write model/diagram snapshots
    Analyze {
        /// Root directory to analyze
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Output directory for snapshots
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Update the existing snapshots for a set of changed paths
    Sync {
        /// Root directory to analyze
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Output directory holding the snapshots
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Changed repo-relative paths; empty means full re-analysis
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
    },

    /// Merge an externally authored diagram into the diagram set
    Merge {
        /// Diagram type (architecture, dependencies, sequence, class, er, state)
        #[arg(short = 't', long = "type")]
        diagram_type: String,

        /// File containing the diagram markup
        #[arg(short, long)]
        markup: PathBuf,

        /// Optional description
        #[arg(short, long)]
        description: Option<String>,

        /// Output directory holding the snapshots
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove a diagram from the diagram set by id
    Remove {
        /// Diagram id
        id: String,

        /// Output directory holding the snapshots
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn execute(self, mut config: Config) -> Result<()> {
        match self.command {
            Commands::Init { path } => {
                let target = path.unwrap_or_else(|| PathBuf::from("."));
                let config_path = target.join("Archscope.toml");
                Config::default().save(&config_path)?;
                info!("Wrote default configuration to {}", config_path.display());
                Ok(())
            }

            Commands::Analyze { root, output } => {
                apply_overrides(&mut config, root, output);
                let out_dir = output_dir(&config);
                let coordinator = AnalysisCoordinator::new(config);

                let outcome = coordinator.analyze().await?;
                report(&outcome);

                coordinator.save_snapshots(&out_dir).await?;
                info!("Snapshots written to {}", out_dir.display());
                Ok(())
            }

            Commands::Sync {
                root,
                output,
                paths,
            } => {
                apply_overrides(&mut config, root, output);
                let out_dir = output_dir(&config);
                let coordinator = AnalysisCoordinator::new(config);

                if !coordinator.load_snapshots(&out_dir).await? {
                    warn!("No previous snapshot found; running a full analysis");
                }

                let outcome = coordinator.notify_changes(paths).await?;
                report(&outcome);

                coordinator.save_snapshots(&out_dir).await?;
                Ok(())
            }

            Commands::Merge {
                diagram_type,
                markup,
                description,
                output,
            } => {
                apply_overrides(&mut config, None, output);
                let out_dir = output_dir(&config);
                let coordinator = AnalysisCoordinator::new(config);
                coordinator.load_snapshots(&out_dir).await?;

                let markup_text = std::fs::read_to_string(&markup)?;
                let record = coordinator
                    .merge_diagram(&diagram_type, &markup_text, description.as_deref())
                    .await?;
                info!("Merged diagram '{}' ({})", record.id, record.title);

                coordinator.save_snapshots(&out_dir).await?;
                Ok(())
            }

            Commands::Remove { id, output } => {
                apply_overrides(&mut config, None, output);
                let out_dir = output_dir(&config);
                let coordinator = AnalysisCoordinator::new(config);
                coordinator.load_snapshots(&out_dir).await?;

                coordinator.remove_diagram(&id).await?;
                info!("Removed diagram '{}'", id);

                coordinator.save_snapshots(&out_dir).await?;
                Ok(())
            }
        }
    }
}

fn apply_overrides(config: &mut Config, root: Option<PathBuf>, output: Option<PathBuf>) {
    if let Some(root) = root {
        config.project.root = root;
    }
    if let Some(output) = output {
        config.project.output_dir = output;
    }
}

/// Output directory, resolved against the analyzed root when relative
fn output_dir(config: &Config) -> PathBuf {
    let out = Path::new(&config.project.output_dir);
    if out.is_absolute() {
        out.to_path_buf()
    } else {
        config.project.root.join(out)
    }
}

fn report(outcome: &AnalysisOutcome) {
    match outcome {
        AnalysisOutcome::Completed(r) => {
            info!(
                "{:?} analysis: {} files ({} skipped) in {}ms",
                r.mode, r.files, r.skipped, r.duration_ms
            );
        }
        AnalysisOutcome::Coalesced => {
            info!("Change set merged into the in-flight analysis batch");
        }
    }
}
