//! Archscope derives a structural model of a source tree (files, symbols,
//! imports, architectural layer and domain membership) and projects it into
//! a small set of Mermaid diagrams, updating the model incrementally when
//! only a handful of files changed.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;

pub use config::Config;
pub use core::AnalysisCoordinator;
pub use error::{ArchscopeError, Result};
