//! Errors raised while turning labels into vectors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// A model file is missing from the cache directory
    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    /// HuggingFace Hub fetch failed
    #[error("Failed to download model: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// TF-IDF found no usable terms in the batch
    #[error("Empty vocabulary: {0}")]
    EmptyVocabulary(String),
}
