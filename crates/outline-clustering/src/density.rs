//! HDBSCAN density clustering.
//!
//! Finds the number of groups on its own. Points HDBSCAN labels as noise
//! each become a singleton cluster so every label keeps an assignment.
//! Input where every vector is the same has no density structure, so it
//! is returned as one cluster without running HDBSCAN.

use hdbscan::{Hdbscan, HdbscanHyperParams};
use tracing::debug;

use outline_types::ClusteringConfig;

use crate::error::ClusteringError;
use crate::similarity::euclidean_distance_squared;
use crate::types::{validate_vectors, Clusterer, ClusteringResult};

/// HDBSCAN backend.
#[derive(Debug, Clone)]
pub struct HdbscanClusterer {
    min_cluster_size: usize,
}

impl HdbscanClusterer {
    pub fn new(min_cluster_size: usize) -> Result<Self, ClusteringError> {
        if min_cluster_size < 2 {
            return Err(ClusteringError::InvalidConfig(
                "min_cluster_size must be >= 2".to_string(),
            ));
        }
        Ok(Self { min_cluster_size })
    }

    pub fn from_config(config: &ClusteringConfig) -> Result<Self, ClusteringError> {
        Self::new(config.min_cluster_size)
    }
}

impl Clusterer for HdbscanClusterer {
    fn name(&self) -> &'static str {
        "hdbscan"
    }

    fn cluster(&self, vectors: &[Vec<f32>]) -> Result<ClusteringResult, ClusteringError> {
        validate_vectors(vectors)?;
        if vectors.len() < self.min_cluster_size {
            return Err(ClusteringError::TooFewPoints {
                needed: self.min_cluster_size,
                got: vectors.len(),
            });
        }

        if all_identical(vectors) {
            debug!(n = vectors.len(), "All points identical, single cluster");
            let labels = vec![0; vectors.len()];
            return Ok(ClusteringResult::from_labels(vectors, &labels, None, 0, true));
        }

        let min_samples = self.min_cluster_size.min(vectors.len() - 1).max(1);
        let hyper_params = HdbscanHyperParams::builder()
            .min_cluster_size(self.min_cluster_size)
            .min_samples(min_samples)
            .build();

        let labels = Hdbscan::new(vectors, hyper_params)
            .cluster()
            .map_err(|e| ClusteringError::Backend(format!("{e:?}")))?;

        let labels = singleton_noise(&labels);
        let result = ClusteringResult::from_labels(vectors, &labels, None, 1, true);

        debug!(
            n = vectors.len(),
            clusters = result.num_clusters(),
            "HDBSCAN complete"
        );

        Ok(result)
    }
}

fn all_identical(vectors: &[Vec<f32>]) -> bool {
    let first = &vectors[0];
    vectors[1..]
        .iter()
        .all(|v| euclidean_distance_squared(first, v) <= f32::EPSILON)
}

/// Map HDBSCAN labels to non-negative ids, giving each noise point its own.
fn singleton_noise(labels: &[i32]) -> Vec<usize> {
    let mut next = labels.iter().copied().max().unwrap_or(-1) + 1;
    labels
        .iter()
        .map(|&label| {
            if label < 0 {
                let id = next;
                next += 1;
                id as usize
            } else {
                label as usize
            }
        })
        .collect()
}
