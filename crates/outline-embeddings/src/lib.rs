//! # outline-embeddings
//!
//! Turns topic labels into vectors for clustering.
//!
//! ## Backends
//! - Transformer encoder run locally with Candle (BERT family, mean pooled)
//! - TF-IDF bag-of-words vectorizer, fitted per batch, used when the
//!   transformer is disabled or unavailable
//!
//! Model files are downloaded from the HuggingFace Hub once and cached.

pub mod cache;
pub mod candle;
pub mod error;
pub mod model;
pub mod tfidf;

pub use crate::candle::{select_device, CandleEmbedder};
pub use cache::{get_or_download_model, ModelCache, ModelPaths, DEFAULT_MODEL_REPO, MODEL_FILES};
pub use error::EmbeddingError;
pub use model::{Embedding, EmbeddingModel, ModelInfo};
pub use tfidf::{TfIdf, TfIdfEmbedder, DEFAULT_MAX_FEATURES};
