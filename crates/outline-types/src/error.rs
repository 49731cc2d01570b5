//! Error types for the course outline system.

use thiserror::Error;

/// Unified error type for request handling and configuration.
#[derive(Debug, Error)]
pub enum OutlineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Prompt could not be interpreted
    #[error("Invalid prompt: {0}")]
    Prompt(String),
}
