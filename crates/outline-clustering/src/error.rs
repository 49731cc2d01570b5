//! Clustering error types.

use thiserror::Error;

/// Errors that can occur during clustering.
#[derive(Debug, Error)]
pub enum ClusteringError {
    /// No vectors to cluster
    #[error("No vectors to cluster")]
    Empty,

    /// Vectors of different lengths
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// NaN or infinite component
    #[error("Vector {0} has a non-finite component")]
    NonFinite(usize),

    /// Fewer points than the algorithm needs
    #[error("Too few points: need {needed}, got {got}")]
    TooFewPoints { needed: usize, got: usize },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Backend failure
    #[error("Clustering backend error: {0}")]
    Backend(String),
}
