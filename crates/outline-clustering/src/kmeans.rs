//! K-means clustering.
//!
//! Lloyd iteration with deterministic farthest-point seeding: the first
//! centroid is the first vector, each following centroid is the vector
//! farthest from those already chosen. Same input, same clusters.
//!
//! Like the stock routines it stands in for, `k` larger than the number of
//! points is an error rather than a silent clamp.

use tracing::debug;

use outline_types::ClusteringConfig;

use crate::error::ClusteringError;
use crate::similarity::euclidean_distance_squared;
use crate::types::{validate_vectors, Clusterer, ClusteringResult};

/// Lloyd's k-means.
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
    convergence_threshold: f32,
}

impl KMeans {
    /// Create a clusterer, validating parameters.
    pub fn new(
        k: usize,
        max_iterations: usize,
        convergence_threshold: f32,
    ) -> Result<Self, ClusteringError> {
        if k == 0 {
            return Err(ClusteringError::InvalidConfig("k must be > 0".to_string()));
        }
        if max_iterations == 0 {
            return Err(ClusteringError::InvalidConfig(
                "max_iterations must be > 0".to_string(),
            ));
        }
        if !convergence_threshold.is_finite() || convergence_threshold <= 0.0 {
            return Err(ClusteringError::InvalidConfig(
                "convergence_threshold must be a finite positive number".to_string(),
            ));
        }
        Ok(Self {
            k,
            max_iterations,
            convergence_threshold,
        })
    }

    /// Create from configuration.
    pub fn from_config(config: &ClusteringConfig) -> Result<Self, ClusteringError> {
        Self::new(config.k, config.max_iterations, config.convergence_threshold)
    }
}

impl Clusterer for KMeans {
    fn name(&self) -> &'static str {
        "kmeans"
    }

    fn cluster(&self, vectors: &[Vec<f32>]) -> Result<ClusteringResult, ClusteringError> {
        validate_vectors(vectors)?;
        if self.k > vectors.len() {
            return Err(ClusteringError::TooFewPoints {
                needed: self.k,
                got: vectors.len(),
            });
        }

        let mut centroids = seed_centroids(vectors, self.k);
        let mut assignments = vec![0usize; vectors.len()];
        let mut iterations = 0;
        let mut converged = false;

        for iter in 0..self.max_iterations {
            iterations = iter + 1;

            for (i, vector) in vectors.iter().enumerate() {
                assignments[i] = nearest_centroid(vector, &centroids);
            }

            let new_centroids = compute_centroids(vectors, &assignments, &centroids);

            let max_movement = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(old, new)| euclidean_distance_squared(old, new).sqrt())
                .fold(0.0f32, f32::max);

            centroids = new_centroids;

            if max_movement < self.convergence_threshold {
                converged = true;
                break;
            }
        }

        // Final assignment against the settled centroids
        for (i, vector) in vectors.iter().enumerate() {
            assignments[i] = nearest_centroid(vector, &centroids);
        }

        let result =
            ClusteringResult::from_labels(vectors, &assignments, Some(&centroids), iterations, converged);

        debug!(
            k = self.k,
            n = vectors.len(),
            clusters = result.num_clusters(),
            iterations,
            converged,
            wcss = result.wcss,
            "k-means complete"
        );

        Ok(result)
    }
}

fn nearest_centroid(vector: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (j, centroid) in centroids.iter().enumerate() {
        let dist = euclidean_distance_squared(vector, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = j;
        }
    }
    best
}

/// Farthest-point seeding.
fn seed_centroids(vectors: &[Vec<f32>], k: usize) -> Vec<Vec<f32>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(vectors[0].clone());

    let mut min_distances = vec![f32::MAX; vectors.len()];

    while centroids.len() < k {
        if let Some(last) = centroids.last() {
            for (i, vector) in vectors.iter().enumerate() {
                let dist = euclidean_distance_squared(vector, last);
                if dist < min_distances[i] {
                    min_distances[i] = dist;
                }
            }
        }

        // Ties (including all-duplicate input) resolve to the lowest index
        let mut far_idx = 0;
        let mut far_dist = -1.0f32;
        for (i, &d) in min_distances.iter().enumerate() {
            if d > far_dist {
                far_dist = d;
                far_idx = i;
            }
        }
        min_distances[far_idx] = 0.0;
        centroids.push(vectors[far_idx].clone());
    }

    centroids
}

/// Mean of assigned points; a centroid with no points keeps its position.
fn compute_centroids(
    vectors: &[Vec<f32>],
    assignments: &[usize],
    previous: &[Vec<f32>],
) -> Vec<Vec<f32>> {
    let dim = previous.first().map(Vec::len).unwrap_or(0);
    let mut sums = vec![vec![0.0f32; dim]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (vector, &cluster) in vectors.iter().zip(assignments.iter()) {
        counts[cluster] += 1;
        for (acc, &val) in sums[cluster].iter_mut().zip(vector.iter()) {
            *acc += val;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous.iter())
        .map(|((mut sum, count), prev)| {
            if count == 0 {
                return prev.clone();
            }
            for val in sum.iter_mut() {
                *val /= count as f32;
            }
            sum
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![5.0, 5.1],
        ]
    }

    #[test]
    fn test_new_rejects_invalid() {
        assert!(KMeans::new(0, 10, 1e-4).is_err());
        assert!(KMeans::new(2, 0, 1e-4).is_err());
        assert!(KMeans::new(2, 10, 0.0).is_err());
        assert!(KMeans::new(2, 10, f32::INFINITY).is_err());
    }

    #[test]
    fn test_from_config_defaults() {
        let kmeans = KMeans::from_config(&ClusteringConfig::default()).unwrap();
        assert_eq!(kmeans.k, 5);
    }

    #[test]
    fn test_separates_two_blobs() {
        let vectors = two_blobs();
        let result = KMeans::new(2, 100, 1e-6).unwrap().cluster(&vectors).unwrap();
        assert_eq!(result.num_clusters(), 2);
        assert!(result.converged);
        let a = result.assignments[0];
        assert!(result.assignments[..3].iter().all(|&c| c == a));
        assert!(result.assignments[3..].iter().all(|&c| c != a));
    }

    #[test]
    fn test_centroids_are_blob_means() {
        let vectors = two_blobs();
        let result = KMeans::new(2, 100, 1e-6).unwrap().cluster(&vectors).unwrap();
        let low = &result.clusters[result.assignments[0]].centroid;
        assert!((low[0] - 0.1 / 3.0).abs() < 1e-4);
        assert!((low[1] - 0.1 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_deterministic() {
        let vectors = two_blobs();
        let kmeans = KMeans::new(3, 100, 1e-6).unwrap();
        let a = kmeans.cluster(&vectors).unwrap();
        let b = kmeans.cluster(&vectors).unwrap();
        assert_eq!(a.assignments, b.assignments);
    }

    #[test]
    fn test_k_equals_n() {
        let vectors = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let result = KMeans::new(3, 10, 1e-6).unwrap().cluster(&vectors).unwrap();
        assert_eq!(result.num_clusters(), 3);
        assert!(result.wcss.abs() < 1e-6);
    }

    #[test]
    fn test_k_greater_than_n_fails() {
        let vectors = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let err = KMeans::new(5, 10, 1e-6).unwrap().cluster(&vectors).unwrap_err();
        assert!(matches!(
            err,
            ClusteringError::TooFewPoints { needed: 5, got: 2 }
        ));
    }

    #[test]
    fn test_duplicate_points_collapse() {
        let vectors = vec![vec![1.0, 0.0]; 4];
        let result = KMeans::new(2, 10, 1e-6).unwrap().cluster(&vectors).unwrap();
        // Both seeds coincide, so every point lands in the first cluster
        assert_eq!(result.num_clusters(), 1);
        assert_eq!(result.clusters[0].len(), 4);
    }

    #[test]
    fn test_empty_input_fails() {
        let err = KMeans::new(1, 10, 1e-6).unwrap().cluster(&[]).unwrap_err();
        assert!(matches!(err, ClusteringError::Empty));
    }

    #[test]
    fn test_iteration_cap() {
        let vectors = two_blobs();
        let result = KMeans::new(2, 1, 1e-9).unwrap().cluster(&vectors).unwrap();
        assert_eq!(result.iterations, 1);
    }
}
