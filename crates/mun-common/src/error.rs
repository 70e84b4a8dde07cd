//! Common error types shared across MUN crates

use thiserror::Error;

/// Result type alias for MUN operations
pub type Result<T> = std::result::Result<T, MunError>;

/// Main error type for cross-cutting failures
#[derive(Error, Debug)]
pub enum MunError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
