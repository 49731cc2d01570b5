//! Outline processing pipeline.
//!
//! Embeds the request's topic labels, clusters them, and builds the
//! outline. Embedding and clustering are best effort: when the transformer
//! fails the TF-IDF vectorizer takes over, and when that or the clustering
//! backend fails the outline is still built. Only invalid requests fail.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use outline_clustering::{build_clusterer, Clusterer, ClusteringResult};
use outline_embeddings::{
    CandleEmbedder, Embedding, EmbeddingModel, ModelCache, TfIdf, TfIdfEmbedder,
};
use outline_types::{
    build_outline, CourseOutline, EmbeddingBackend, OutlineLayout, OutlineRequest, Settings,
};

use crate::error::ServiceError;

/// Keywords reported per cluster
const CLUSTER_KEYWORDS: usize = 3;

/// A detected group of topic labels.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub labels: Vec<String>,
    pub keywords: Vec<String>,
    pub cohesion: f32,
}

/// What the pipeline did for one request.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingReport {
    /// Encoder that produced the vectors, or "none"
    pub embedding_backend: String,
    /// Clustering backend, or "disabled"
    pub clustering_backend: String,
    pub clustered: bool,
    pub clusters: Vec<ClusterSummary>,
    /// Degradations encountered along the way
    pub warnings: Vec<String>,
}

/// The outline plus the processing report.
#[derive(Debug, Clone)]
pub struct ProcessedOutline {
    pub outline: CourseOutline,
    pub report: ProcessingReport,
}

/// Pipeline state held for the process lifetime.
pub struct OutlineProcessor {
    primary: Option<Arc<dyn EmbeddingModel>>,
    fallback: TfIdfEmbedder,
    clusterer: Option<Box<dyn Clusterer>>,
    layout: OutlineLayout,
    max_topics: usize,
}

impl OutlineProcessor {
    /// Build a processor around an already loaded encoder (or none).
    pub fn new(
        settings: &Settings,
        primary: Option<Arc<dyn EmbeddingModel>>,
    ) -> Result<Self, ServiceError> {
        let clusterer = if settings.clustering.enabled {
            Some(build_clusterer(&settings.clustering)?)
        } else {
            None
        };

        Ok(Self {
            primary,
            fallback: TfIdfEmbedder::new(settings.embeddings.max_features),
            clusterer,
            layout: settings.layout(),
            max_topics: settings.max_topics,
        })
    }

    /// Build a processor, loading the transformer when configured.
    ///
    /// A transformer that fails to load is logged and replaced by TF-IDF.
    pub fn from_settings(settings: &Settings) -> Result<Self, ServiceError> {
        let primary: Option<Arc<dyn EmbeddingModel>> = match settings.embeddings.backend {
            EmbeddingBackend::Tfidf => {
                info!("Transformer disabled by configuration, using TF-IDF");
                None
            }
            EmbeddingBackend::Transformer => {
                let cache = ModelCache::from_settings(&settings.embeddings);
                match CandleEmbedder::load(&cache, settings.embeddings.device) {
                    Ok(embedder) => Some(Arc::new(embedder)),
                    Err(e) => {
                        warn!(error = %e, repo = %cache.repo_id, "Transformer unavailable, falling back to TF-IDF");
                        None
                    }
                }
            }
        };

        Self::new(settings, primary)
    }

    /// Name of the encoder tried first.
    pub fn embedding_backend_name(&self) -> &str {
        match &self.primary {
            Some(model) => &model.info().name,
            None => &self.fallback.info().name,
        }
    }

    /// Name of the clustering backend.
    pub fn clustering_backend_name(&self) -> &str {
        self.clusterer.as_ref().map(|c| c.name()).unwrap_or("disabled")
    }

    /// Process one request.
    pub fn process(&self, request: OutlineRequest) -> Result<ProcessedOutline, ServiceError> {
        let request = request.normalize();
        request.validate(self.max_topics)?;

        let labels = request.labels();
        let mut report = ProcessingReport {
            embedding_backend: "none".to_string(),
            clustering_backend: self.clustering_backend_name().to_string(),
            clustered: false,
            clusters: Vec::new(),
            warnings: Vec::new(),
        };

        let vectors = self.embed_labels(&labels, &mut report);

        if let (Some(vectors), Some(clusterer)) = (vectors.as_ref(), self.clusterer.as_ref()) {
            match clusterer.cluster(vectors) {
                Ok(result) => {
                    report.clustered = true;
                    report.clusters = summarize_clusters(&labels, vectors, &result);
                }
                Err(e) => {
                    warn!(backend = clusterer.name(), error = %e, "Clustering failed, continuing without it");
                    report.warnings.push(format!("clustering: {e}"));
                }
            }
        }

        let outline = build_outline(&request, &self.layout);

        info!(
            course = %outline.course,
            topics = outline.len(),
            embedding = %report.embedding_backend,
            clustered = report.clustered,
            clusters = report.clusters.len(),
            "Outline generated"
        );

        Ok(ProcessedOutline { outline, report })
    }

    /// Embed with the transformer, then TF-IDF. `None` when both fail.
    fn embed_labels(
        &self,
        labels: &[String],
        report: &mut ProcessingReport,
    ) -> Option<Vec<Vec<f32>>> {
        if let Some(model) = &self.primary {
            match checked_embed(model.as_ref(), labels) {
                Ok(vectors) => {
                    report.embedding_backend = model.info().name.clone();
                    return Some(vectors);
                }
                Err(e) => {
                    warn!(model = %model.info().name, error = %e, "Transformer embedding failed, trying TF-IDF");
                    report.warnings.push(format!("embedding: {e}"));
                }
            }
        }

        match checked_embed(&self.fallback, labels) {
            Ok(vectors) => {
                report.embedding_backend = self.fallback.info().name.clone();
                Some(vectors)
            }
            Err(e) => {
                warn!(error = %e, "TF-IDF embedding failed, skipping clustering");
                report.warnings.push(format!("embedding: {e}"));
                None
            }
        }
    }
}

/// Embed and check that one vector came back per label.
fn checked_embed(model: &dyn EmbeddingModel, labels: &[String]) -> Result<Vec<Vec<f32>>, String> {
    let embeddings = model.embed_texts(labels).map_err(|e| e.to_string())?;
    if embeddings.len() != labels.len() {
        return Err(format!(
            "expected {} embeddings, got {}",
            labels.len(),
            embeddings.len()
        ));
    }
    debug!(
        model = %model.info().name,
        count = embeddings.len(),
        "Labels embedded"
    );
    Ok(embeddings.into_iter().map(Embedding::into_values).collect())
}

fn summarize_clusters(
    labels: &[String],
    vectors: &[Vec<f32>],
    result: &ClusteringResult,
) -> Vec<ClusterSummary> {
    result
        .clusters
        .iter()
        .map(|cluster| {
            let member_labels: Vec<String> = cluster
                .members
                .iter()
                .map(|&i| labels[i].clone())
                .collect();
            let docs: Vec<&str> = member_labels.iter().map(String::as_str).collect();
            let keywords = TfIdf::new(&docs)
                .top_terms(CLUSTER_KEYWORDS)
                .into_iter()
                .map(|(term, _)| term)
                .collect();
            ClusterSummary {
                labels: member_labels,
                keywords,
                cohesion: cluster.cohesion(vectors),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use outline_embeddings::{EmbeddingError, ModelInfo};
    use outline_types::{ClusterAlgorithm, OutlineError};

    struct BrokenModel {
        info: ModelInfo,
    }

    impl BrokenModel {
        fn new() -> Self {
            Self {
                info: ModelInfo {
                    name: "broken".to_string(),
                    dimension: 4,
                    max_sequence_length: 16,
                },
            }
        }
    }

    impl EmbeddingModel for BrokenModel {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        fn embed(&self, _text: &str) -> Result<Embedding, EmbeddingError> {
            Err(EmbeddingError::InvalidInput("model offline".to_string()))
        }
    }

    /// Maps each label to a fixed axis by its first letter.
    struct AxisModel {
        info: ModelInfo,
    }

    impl EmbeddingModel for AxisModel {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
            let axis = if text.to_lowercase().starts_with('m') { 0 } else { 1 };
            let mut values = vec![0.0; 2];
            values[axis] = 1.0;
            Ok(Embedding::new(values))
        }
    }

    fn settings_with_k(k: usize) -> Settings {
        let mut settings = Settings::default();
        settings.clustering.k = k;
        settings
    }

    fn request(main: &str, subs: &[&str], n: usize) -> OutlineRequest {
        OutlineRequest::new(main, subs.iter().map(|s| s.to_string()).collect(), n)
    }

    #[test]
    fn test_tfidf_only_pipeline() {
        let processor = OutlineProcessor::new(&settings_with_k(2), None).unwrap();
        let out = processor
            .process(request(
                "Machine Learning",
                &["Linear Regression", "Logistic Regression"],
                3,
            ))
            .unwrap();
        assert_eq!(out.outline.course, "machine learning");
        assert_eq!(out.outline.len(), 3);
        assert_eq!(out.report.embedding_backend, "tfidf");
        assert!(out.report.clustered);
        assert_eq!(out.report.clusters.len(), 2);
    }

    #[test]
    fn test_broken_transformer_falls_back_to_tfidf() {
        let processor =
            OutlineProcessor::new(&settings_with_k(2), Some(Arc::new(BrokenModel::new()))).unwrap();
        assert_eq!(processor.embedding_backend_name(), "broken");
        let out = processor
            .process(request("Rust", &["Ownership", "Borrowing"], 2))
            .unwrap();
        assert_eq!(out.report.embedding_backend, "tfidf");
        assert!(out.report.warnings.iter().any(|w| w.contains("model offline")));
        assert_eq!(out.outline.len(), 2);
    }

    #[test]
    fn test_clustering_failure_still_builds_outline() {
        // Default k = 5 but only two labels
        let processor = OutlineProcessor::new(&Settings::default(), None).unwrap();
        let out = processor.process(request("Rust", &["Traits"], 4)).unwrap();
        assert!(!out.report.clustered);
        assert!(out.report.warnings.iter().any(|w| w.starts_with("clustering")));
        assert_eq!(out.outline.len(), 4);
    }

    #[test]
    fn test_all_embedding_fails_still_builds_outline() {
        let processor = OutlineProcessor::new(&settings_with_k(1), None).unwrap();
        // Single letters only: TF-IDF has no vocabulary
        let out = processor.process(request("C", &["R"], 1)).unwrap();
        assert_eq!(out.report.embedding_backend, "none");
        assert!(!out.report.clustered);
        assert_eq!(out.outline.course, "c");
        assert_eq!(out.outline.topics[0].subtopics[0].title, "R");
    }

    #[test]
    fn test_numeric_label_is_embedded() {
        let processor = OutlineProcessor::new(&settings_with_k(2), None).unwrap();
        let out = processor
            .process(request("Python 3", &["C", "R", "2024"], 1))
            .unwrap();
        assert_eq!(out.report.embedding_backend, "tfidf");
        assert!(out.report.clustered);

        let year = out
            .report
            .clusters
            .iter()
            .find(|c| c.labels.contains(&"2024".to_string()))
            .unwrap();
        assert_eq!(year.labels, vec!["2024".to_string()]);
        assert!((year.cohesion - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_clustering_disabled() {
        let mut settings = Settings::default();
        settings.clustering.enabled = false;
        let processor = OutlineProcessor::new(&settings, None).unwrap();
        assert_eq!(processor.clustering_backend_name(), "disabled");
        let out = processor.process(request("Rust", &[], 1)).unwrap();
        assert!(!out.report.clustered);
        assert!(out.report.warnings.is_empty());
    }

    #[test]
    fn test_clusters_group_related_labels() {
        let model = AxisModel {
            info: ModelInfo {
                name: "axis".to_string(),
                dimension: 2,
                max_sequence_length: 16,
            },
        };
        let processor = OutlineProcessor::new(&settings_with_k(2), Some(Arc::new(model))).unwrap();
        let out = processor
            .process(request("Music", &["Melody", "Harmony", "Rhythm"], 1))
            .unwrap();
        assert_eq!(out.report.embedding_backend, "axis");
        let mut groups: Vec<Vec<String>> =
            out.report.clusters.iter().map(|c| c.labels.clone()).collect();
        groups.sort();
        assert_eq!(
            groups,
            vec![
                vec!["Harmony".to_string(), "Rhythm".to_string()],
                vec!["Music".to_string(), "Melody".to_string()],
            ]
        );
        for cluster in &out.report.clusters {
            assert!((cluster.cohesion - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_hdbscan_backend_name() {
        let mut settings = Settings::default();
        settings.clustering.algorithm = ClusterAlgorithm::Hdbscan;
        let processor = OutlineProcessor::new(&settings, None).unwrap();
        assert_eq!(processor.clustering_backend_name(), "hdbscan");
    }

    #[test]
    fn test_hdbscan_repeated_label_is_one_cluster() {
        let mut settings = Settings::default();
        settings.clustering.algorithm = ClusterAlgorithm::Hdbscan;
        let processor = OutlineProcessor::new(&settings, None).unwrap();
        let out = processor
            .process(request("Rust", &["Rust", "Rust"], 1))
            .unwrap();
        assert!(out.report.clustered);
        assert_eq!(out.report.clusters.len(), 1);
        assert_eq!(out.report.clusters[0].labels.len(), 3);
    }

    #[test]
    fn test_invalid_request_is_error() {
        let processor = OutlineProcessor::new(&Settings::default(), None).unwrap();
        let err = processor.process(request("  ", &[], 1)).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Outline(OutlineError::InvalidInput(_))
        ));

        let err = processor.process(request("Rust", &[], 51)).unwrap_err();
        assert!(matches!(err, ServiceError::Outline(_)));
    }

    #[test]
    fn test_invalid_clustering_config_fails_construction() {
        let mut settings = Settings::default();
        settings.clustering.max_iterations = 0;
        assert!(OutlineProcessor::new(&settings, None).is_err());
    }

    #[test]
    fn test_blank_subtopics_dropped() {
        let processor = OutlineProcessor::new(&settings_with_k(1), None).unwrap();
        let out = processor
            .process(request("Rust", &["  ", "Lifetimes"], 1))
            .unwrap();
        assert_eq!(out.outline.topics[0].subtopics[0].title, "Lifetimes");
    }
}
