//! Configuration loading for the course outline service.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `~/.config/course-outline/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::OutlineError;
use crate::outline::{OutlineLayout, DEFAULT_SUBTOPICS_PER_TOPIC};

/// Which encoder turns topic labels into vectors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Pretrained transformer via Candle, TF-IDF when it cannot load
    #[default]
    Transformer,
    /// TF-IDF bag-of-words only
    Tfidf,
}

impl EmbeddingBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingBackend::Transformer => "transformer",
            EmbeddingBackend::Tfidf => "tfidf",
        }
    }
}

impl std::str::FromStr for EmbeddingBackend {
    type Err = OutlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transformer" => Ok(EmbeddingBackend::Transformer),
            "tfidf" | "tf-idf" => Ok(EmbeddingBackend::Tfidf),
            other => Err(OutlineError::Config(format!(
                "unknown embedding backend: {other}"
            ))),
        }
    }
}

/// Device the transformer runs on. Accelerators fall back to CPU when
/// unavailable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComputeDevice {
    #[default]
    Cpu,
    Cuda,
    Metal,
}

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// HuggingFace repository of the encoder
    #[serde(default = "default_model_repo")]
    pub model_repo: String,

    /// Model cache directory (platform cache dir when unset)
    #[serde(default)]
    pub cache_dir: Option<String>,

    #[serde(default)]
    pub device: ComputeDevice,

    /// Vocabulary cap for the TF-IDF vectorizer
    #[serde(default = "default_max_features")]
    pub max_features: usize,
}

fn default_model_repo() -> String {
    "bert-base-uncased".to_string()
}

fn default_max_features() -> usize {
    1000
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model_repo: default_model_repo(),
            cache_dir: None,
            device: ComputeDevice::default(),
            max_features: default_max_features(),
        }
    }
}

impl EmbeddingSettings {
    /// Cache directory with `~/` expanded, if one is configured.
    pub fn expanded_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.as_deref().map(expand_home)
    }
}

/// Clustering algorithm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClusterAlgorithm {
    #[default]
    Kmeans,
    Hdbscan,
}

impl ClusterAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterAlgorithm::Kmeans => "kmeans",
            ClusterAlgorithm::Hdbscan => "hdbscan",
        }
    }
}

/// Clustering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Clustering runs unless switched off
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub algorithm: ClusterAlgorithm,

    /// Number of k-means clusters
    #[serde(default = "default_k")]
    pub k: usize,

    /// Maximum k-means iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Stop when no centroid moves further than this
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f32,

    /// Minimum cluster size for HDBSCAN
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,
}

fn default_true() -> bool {
    true
}
fn default_k() -> usize {
    5
}
fn default_max_iterations() -> usize {
    100
}
fn default_convergence_threshold() -> f32 {
    1e-4
}
fn default_min_cluster_size() -> usize {
    2
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            algorithm: ClusterAlgorithm::default(),
            k: default_k(),
            max_iterations: default_max_iterations(),
            convergence_threshold: default_convergence_threshold(),
            min_cluster_size: default_min_cluster_size(),
        }
    }
}

impl ClusteringConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.k == 0 {
            return Err("k must be > 0".to_string());
        }
        if self.max_iterations == 0 {
            return Err("max_iterations must be > 0".to_string());
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold <= 0.0 {
            return Err(format!(
                "convergence_threshold must be a positive number, got {}",
                self.convergence_threshold
            ));
        }
        if self.min_cluster_size < 2 {
            return Err("min_cluster_size must be >= 2".to_string());
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP listen host
    #[serde(default = "default_http_host")]
    pub http_host: String,

    /// HTTP listen port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on requested topics
    #[serde(default = "default_max_topics")]
    pub max_topics: usize,

    /// Lessons emitted under each topic
    #[serde(default = "default_subtopics_per_topic")]
    pub subtopics_per_topic: usize,

    #[serde(default)]
    pub embeddings: EmbeddingSettings,

    #[serde(default)]
    pub clustering: ClusteringConfig,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    5001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_topics() -> usize {
    50
}

fn default_subtopics_per_topic() -> usize {
    DEFAULT_SUBTOPICS_PER_TOPIC
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http_host: default_http_host(),
            http_port: default_http_port(),
            log_level: default_log_level(),
            max_topics: default_max_topics(),
            subtopics_per_topic: default_subtopics_per_topic(),
            embeddings: EmbeddingSettings::default(),
            clustering: ClusteringConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/course-outline/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (OUTLINE_*, nested keys joined with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, OutlineError> {
        let config_dir = ProjectDirs::from("", "", "course-outline")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("http_host", default_http_host())
            .map_err(|e| OutlineError::Config(e.to_string()))?
            .set_default("http_port", default_http_port() as i64)
            .map_err(|e| OutlineError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| OutlineError::Config(e.to_string()))?
            .set_default("max_topics", default_max_topics() as i64)
            .map_err(|e| OutlineError::Config(e.to_string()))?
            .set_default("subtopics_per_topic", default_subtopics_per_topic() as i64)
            .map_err(|e| OutlineError::Config(e.to_string()))?
            .set_default("embeddings.model_repo", default_model_repo())
            .map_err(|e| OutlineError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // OUTLINE_HTTP_PORT, OUTLINE_EMBEDDINGS__BACKEND, OUTLINE_CLUSTERING__K, ...
        builder = builder.add_source(
            Environment::with_prefix("OUTLINE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| OutlineError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| OutlineError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), OutlineError> {
        if self.max_topics == 0 {
            return Err(OutlineError::Config("max_topics must be > 0".to_string()));
        }
        if self.subtopics_per_topic == 0 {
            return Err(OutlineError::Config(
                "subtopics_per_topic must be > 0".to_string(),
            ));
        }
        if self.embeddings.max_features == 0 {
            return Err(OutlineError::Config(
                "embeddings.max_features must be > 0".to_string(),
            ));
        }
        self.clustering
            .validate()
            .map_err(|e| OutlineError::Config(format!("clustering: {e}")))
    }

    /// Socket address string for the HTTP server
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Outline shape derived from these settings
    pub fn layout(&self) -> OutlineLayout {
        OutlineLayout {
            subtopics_per_topic: self.subtopics_per_topic,
        }
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.http_port, 5001);
        assert_eq!(settings.http_host, "127.0.0.1");
        assert_eq!(settings.max_topics, 50);
        assert_eq!(settings.subtopics_per_topic, 3);
        assert_eq!(settings.embeddings.backend, EmbeddingBackend::Transformer);
        assert_eq!(settings.embeddings.model_repo, "bert-base-uncased");
        assert_eq!(settings.embeddings.max_features, 1000);
        assert_eq!(settings.clustering.algorithm, ClusterAlgorithm::Kmeans);
        assert_eq!(settings.clustering.k, 5);
    }

    #[test]
    fn test_load_with_defaults() {
        let settings = Settings::load(None).unwrap();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_layers_file_then_env() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "http_port = 6001\nlog_level = \"debug\"\n\n[clustering]\nk = 3\n",
        )
        .unwrap();
        let path = path.to_string_lossy().to_string();

        let from_file = Settings::load(Some(&path)).unwrap();
        assert_eq!(from_file.http_port, 6001);
        assert_eq!(from_file.log_level, "debug");
        assert_eq!(from_file.clustering.k, 3);
        assert_eq!(from_file.max_topics, 50);

        std::env::set_var("OUTLINE_CLUSTERING__K", "4");
        let with_env = Settings::load(Some(&path));
        std::env::remove_var("OUTLINE_CLUSTERING__K");

        let with_env = with_env.unwrap();
        assert_eq!(with_env.clustering.k, 4);
        assert_eq!(with_env.http_port, 6001);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let result = Settings::load(Some(&path.to_string_lossy()));
        assert!(matches!(result, Err(OutlineError::Config(_))));
    }

    #[test]
    fn test_http_addr() {
        let settings = Settings::default();
        assert_eq!(settings.http_addr(), "127.0.0.1:5001");
    }

    #[test]
    fn test_layout_from_settings() {
        let settings = Settings {
            subtopics_per_topic: 4,
            ..Settings::default()
        };
        assert_eq!(settings.layout().subtopics_per_topic, 4);
    }

    #[test]
    fn test_validate_rejects_zero_topics() {
        let settings = Settings {
            max_topics: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_clustering_validation() {
        let mut config = ClusteringConfig::default();
        assert!(config.validate().is_ok());

        config.k = 0;
        assert!(config.validate().is_err());

        config.k = 3;
        config.convergence_threshold = f32::NAN;
        assert!(config.validate().is_err());

        config.convergence_threshold = 1e-3;
        config.min_cluster_size = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!(
            "TFIDF".parse::<EmbeddingBackend>().unwrap(),
            EmbeddingBackend::Tfidf
        );
        assert_eq!(
            "transformer".parse::<EmbeddingBackend>().unwrap(),
            EmbeddingBackend::Transformer
        );
        assert!("word2vec".parse::<EmbeddingBackend>().is_err());
    }

    #[test]
    fn test_settings_from_toml_shape() {
        let settings: Settings = serde_json::from_str(
            r#"{"embeddings":{"backend":"tfidf","device":"cuda"},"clustering":{"algorithm":"hdbscan"}}"#,
        )
        .unwrap();
        assert_eq!(settings.embeddings.backend, EmbeddingBackend::Tfidf);
        assert_eq!(settings.embeddings.device, ComputeDevice::Cuda);
        assert_eq!(settings.clustering.algorithm, ClusterAlgorithm::Hdbscan);
        assert_eq!(settings.http_port, 5001);
    }

    #[test]
    fn test_expand_home() {
        let plain = expand_home("/var/cache/models");
        assert_eq!(plain, PathBuf::from("/var/cache/models"));
        let expanded = expand_home("~/models");
        assert!(expanded.ends_with("models"));
    }
}
