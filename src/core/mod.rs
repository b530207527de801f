mod classifier;
mod collector;
mod coordinator;
mod diagrams;
mod extractor;
mod graph;
mod model;
mod projector;

// Language-specific extraction profiles
mod languages;

pub use classifier::{dominant_layer, Classifier};
pub use collector::FileCollector;
pub use coordinator::{AnalysisCoordinator, AnalysisMode, AnalysisOutcome, AnalysisReport};
pub use diagrams::{DiagramDialect, DiagramRecord, DiagramSet, AUTO_LABEL};
pub use extractor::SymbolExtractor;
pub use graph::DependencyGraphBuilder;
pub use languages::LanguageProfile;
pub use model::{
    ClassRecord, CodebaseModel, DependencyEdge, DomainGroup, ExportKind, ExportRecord,
    FileRecord, FunctionRecord, ImportRecord, Language, Layer, LAYER_PRIORITY,
};
pub use projector::DiagramProjector;
