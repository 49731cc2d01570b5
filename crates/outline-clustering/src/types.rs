//! Clustering result types and the backend trait.

use crate::error::ClusteringError;
use crate::similarity::{cosine_similarity, euclidean_distance_squared};

/// A group of input vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Mean of the member vectors
    pub centroid: Vec<f32>,
    /// Indices into the clustered input
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Mean cosine similarity of members to the centroid, 0.0 when empty.
    pub fn cohesion(&self, vectors: &[Vec<f32>]) -> f32 {
        if self.members.is_empty() {
            return 0.0;
        }
        let total: f32 = self
            .members
            .iter()
            .map(|&i| cosine_similarity(&vectors[i], &self.centroid))
            .sum();
        total / self.members.len() as f32
    }
}

/// Output of a clustering run.
#[derive(Debug, Clone)]
pub struct ClusteringResult {
    /// Clusters, empty ones dropped
    pub clusters: Vec<Cluster>,
    /// Cluster index (into `clusters`) for every input vector
    pub assignments: Vec<usize>,
    /// Iterations run
    pub iterations: usize,
    /// Whether the run converged before the iteration cap
    pub converged: bool,
    /// Within-cluster sum of squared distances
    pub wcss: f32,
}

impl ClusteringResult {
    /// Assemble a result from raw labels, dropping empty clusters and
    /// renumbering the rest in order of first appearance.
    pub fn from_labels(
        vectors: &[Vec<f32>],
        labels: &[usize],
        centroids: Option<&[Vec<f32>]>,
        iterations: usize,
        converged: bool,
    ) -> Self {
        let mut remap: Vec<Option<usize>> = Vec::new();
        let mut clusters: Vec<Cluster> = Vec::new();
        let mut assignments = Vec::with_capacity(labels.len());

        for (i, &label) in labels.iter().enumerate() {
            if label >= remap.len() {
                remap.resize(label + 1, None);
            }
            let idx = match remap[label] {
                Some(idx) => idx,
                None => {
                    let idx = clusters.len();
                    remap[label] = Some(idx);
                    let centroid = centroids
                        .and_then(|c| c.get(label).cloned())
                        .unwrap_or_default();
                    clusters.push(Cluster {
                        centroid,
                        members: Vec::new(),
                    });
                    idx
                }
            };
            clusters[idx].members.push(i);
            assignments.push(idx);
        }

        for cluster in clusters.iter_mut() {
            if cluster.centroid.is_empty() {
                let members: Vec<&[f32]> = cluster
                    .members
                    .iter()
                    .map(|&i| vectors[i].as_slice())
                    .collect();
                cluster.centroid = crate::similarity::mean_vector(&members);
            }
        }

        let wcss = assignments
            .iter()
            .enumerate()
            .map(|(i, &c)| euclidean_distance_squared(&vectors[i], &clusters[c].centroid))
            .sum();

        Self {
            clusters,
            assignments,
            iterations,
            converged,
            wcss,
        }
    }

    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }
}

/// A clustering backend.
pub trait Clusterer: Send + Sync {
    /// Backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Cluster the given vectors.
    fn cluster(&self, vectors: &[Vec<f32>]) -> Result<ClusteringResult, ClusteringError>;
}

/// Check input shape shared by all backends. Returns the dimension.
pub fn validate_vectors(vectors: &[Vec<f32>]) -> Result<usize, ClusteringError> {
    let first = vectors.first().ok_or(ClusteringError::Empty)?;
    let dim = first.len();
    if dim == 0 {
        return Err(ClusteringError::DimensionMismatch {
            expected: 1,
            actual: 0,
        });
    }
    for (i, v) in vectors.iter().enumerate() {
        if v.len() != dim {
            return Err(ClusteringError::DimensionMismatch {
                expected: dim,
                actual: v.len(),
            });
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(ClusteringError::NonFinite(i));
        }
    }
    Ok(dim)
}
