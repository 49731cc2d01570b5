//! Service error types.

use thiserror::Error;

use outline_clustering::ClusteringError;
use outline_types::OutlineError;

/// Errors surfaced by the processor and server.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad request or configuration
    #[error(transparent)]
    Outline(#[from] OutlineError),

    /// Clustering backend could not be built
    #[error("Clustering setup failed: {0}")]
    Clustering(#[from] ClusteringError),

    /// Blocking task panicked or was cancelled
    #[error("Processing task failed: {0}")]
    Task(String),

    /// Server IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
