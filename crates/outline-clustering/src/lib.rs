//! # outline-clustering
//!
//! Groups topic label embeddings to detect which subtopics belong
//! together.
//!
//! ## Features
//! - K-means with deterministic seeding (default, k = 5)
//! - HDBSCAN for an automatic cluster count
//! - Cosine and Euclidean helpers shared by both

pub mod density;
pub mod error;
pub mod kmeans;
mod similarity;
pub mod types;

use outline_types::{ClusterAlgorithm, ClusteringConfig};

pub use density::HdbscanClusterer;
pub use error::ClusteringError;
pub use kmeans::KMeans;
pub use types::{Cluster, Clusterer, ClusteringResult};

/// Build the backend named by the configuration.
pub fn build_clusterer(config: &ClusteringConfig) -> Result<Box<dyn Clusterer>, ClusteringError> {
    Ok(match config.algorithm {
        ClusterAlgorithm::Kmeans => Box::new(KMeans::from_config(config)?),
        ClusterAlgorithm::Hdbscan => Box::new(HdbscanClusterer::from_config(config)?),
    })
}
