use thiserror::Error;

/// Main error type for Archscope operations
#[derive(Error, Debug)]
pub enum ArchscopeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Model integrity error: {0}")]
    ModelIntegrity(String),

    #[error("Diagram markup rejected: {0}")]
    DiagramMarkup(String),

    #[error("Diagram not found: {0}")]
    DiagramNotFound(String),
}

pub type Result<T> = std::result::Result<T, ArchscopeError>;
