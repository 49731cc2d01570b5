//! TF-IDF vectorizer and keyword scorer.
//!
//! [`TfIdfEmbedder`] is the bag-of-words encoder used when the transformer
//! cannot be loaded or fails. It fits its vocabulary on each batch, so the
//! vectors of one batch are comparable with each other but not with the
//! vectors of another batch. Its tokens are every run of two or more word
//! characters, numbers and stop words included.
//!
//! [`TfIdf`] scores terms across a small corpus and is used to name
//! clusters by their strongest keywords. It skips stop words and numbers.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

/// Default vocabulary cap
pub const DEFAULT_MAX_FEATURES: usize = 1000;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid token pattern"));

/// Split lowercased text into vectorizer terms: runs of two or more word
/// characters.
pub fn vectorizer_tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Bag-of-words TF-IDF encoder.
pub struct TfIdfEmbedder {
    max_features: usize,
    info: ModelInfo,
}

impl Default for TfIdfEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FEATURES)
    }
}

impl TfIdfEmbedder {
    /// Create a vectorizer keeping at most `max_features` terms.
    pub fn new(max_features: usize) -> Self {
        let max_features = max_features.max(1);
        Self {
            max_features,
            info: ModelInfo {
                name: "tfidf".to_string(),
                dimension: max_features,
                max_sequence_length: usize::MAX,
            },
        }
    }

    /// Build the vocabulary for a tokenized corpus.
    ///
    /// Keeps the `max_features` most frequent terms (ties broken
    /// alphabetically) and assigns columns in alphabetical order.
    fn fit_vocabulary(&self, docs: &[Vec<String>]) -> BTreeMap<String, usize> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for doc in docs {
            for term in doc {
                *counts.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut terms: Vec<&str> = ranked.into_iter().map(|(t, _)| t).collect();
        terms.sort_unstable();

        terms
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect()
    }
}

impl EmbeddingModel for TfIdfEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidInput("empty batch result".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let docs: Vec<Vec<String>> = texts.iter().map(|t| vectorizer_tokens(t)).collect();
        let vocabulary = self.fit_vocabulary(&docs);
        if vocabulary.is_empty() {
            return Err(EmbeddingError::EmptyVocabulary(
                "no label has a word of two or more characters".to_string(),
            ));
        }

        let n = docs.len() as f32;
        let mut doc_frequency = vec![0usize; vocabulary.len()];
        for doc in &docs {
            let unique: HashSet<&String> = doc.iter().collect();
            for term in unique {
                if let Some(&col) = vocabulary.get(term.as_str()) {
                    doc_frequency[col] += 1;
                }
            }
        }

        // Smoothed IDF: ln((1 + n) / (1 + df)) + 1
        let idf: Vec<f32> = doc_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let embeddings: Vec<Embedding> = docs
            .iter()
            .map(|doc| {
                let mut row = vec![0.0f32; vocabulary.len()];
                for term in doc {
                    if let Some(&col) = vocabulary.get(term.as_str()) {
                        row[col] += 1.0;
                    }
                }
                for (value, weight) in row.iter_mut().zip(idf.iter()) {
                    *value *= weight;
                }
                Embedding::new(row)
            })
            .collect();

        debug!(
            count = embeddings.len(),
            vocabulary = vocabulary.len(),
            "TF-IDF batch complete"
        );

        Ok(embeddings)
    }
}

/// TF-IDF calculator for keyword extraction.
///
/// Computes term importance based on frequency within documents and rarity
/// across the document corpus.
pub struct TfIdf {
    /// Term -> number of documents containing it
    doc_frequencies: HashMap<String, usize>,
    /// Term -> total frequency across all documents
    term_frequencies: HashMap<String, usize>,
    doc_count: usize,
}

impl TfIdf {
    /// Create a new TF-IDF calculator from a corpus of documents.
    pub fn new(documents: &[&str]) -> Self {
        let mut doc_frequencies: HashMap<String, usize> = HashMap::new();
        let mut term_frequencies: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms = tokenize(doc);
            let unique_terms: HashSet<&String> = terms.iter().collect();

            for term in unique_terms {
                *doc_frequencies.entry(term.clone()).or_insert(0) += 1;
            }

            for term in terms {
                *term_frequencies.entry(term).or_insert(0) += 1;
            }
        }

        Self {
            doc_frequencies,
            term_frequencies,
            doc_count: documents.len(),
        }
    }

    /// TF-IDF score for a term: (count / total terms) * smoothed IDF.
    pub fn score(&self, term: &str) -> f32 {
        self.term_frequency(term) * self.inverse_document_frequency(term)
    }

    fn term_frequency(&self, term: &str) -> f32 {
        let count = *self.term_frequencies.get(term).unwrap_or(&0) as f32;
        let total: usize = self.term_frequencies.values().sum();
        if total == 0 {
            return 0.0;
        }
        count / total as f32
    }

    fn inverse_document_frequency(&self, term: &str) -> f32 {
        let df = *self.doc_frequencies.get(term).unwrap_or(&0) as f32;
        if df == 0.0 {
            return 0.0;
        }
        let n = self.doc_count as f32;
        ((n + 1.0) / (df + 1.0)).ln() + 1.0
    }

    /// Top `n` terms by score, highest first. Ties are alphabetical.
    pub fn top_terms(&self, n: usize) -> Vec<(String, f32)> {
        let mut scores: Vec<(String, f32)> = self
            .term_frequencies
            .keys()
            .map(|term| (term.clone(), self.score(term)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scores.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        scores.truncate(n);
        scores
    }
}

/// Tokenize text into lowercase words.
///
/// Drops stop words, single characters and pure numbers.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.chars().count() > 1)
        .filter(|s| !is_stop_word(s))
        .filter(|s| !s.chars().all(|c| c.is_numeric()))
        .map(String::from)
        .collect()
}

fn is_stop_word(word: &str) -> bool {
    const STOP_WORDS: &[&str] = &[
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
        "it", "its", "of", "on", "or", "that", "the", "to", "was", "were", "will", "with", "this",
        "they", "but", "have", "had", "what", "when", "where", "who", "which", "why", "how", "all",
        "each", "every", "both", "few", "more", "most", "other", "some", "such", "no", "nor",
        "not", "only", "own", "same", "so", "than", "too", "very", "can", "just", "should", "now",
        "also", "been", "being", "do", "does", "did", "doing", "would", "could", "might", "must",
        "shall", "about", "above", "after", "again", "against", "am", "any", "before", "below",
        "between", "into", "through", "during", "out", "over", "under", "up", "down", "then",
        "once", "here", "there", "if", "else", "while", "because", "until", "we", "you", "your",
        "our", "their", "him", "her", "them", "me", "my", "myself", "itself", "those", "these",
        "his",
    ];

    STOP_WORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &Embedding, b: &Embedding) -> f32 {
        a.values.iter().zip(&b.values).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(tokenize("Hello World"), vec!["hello", "world"]);
    }

    #[test]
    fn test_tokenize_filters() {
        let tokens = tokenize("The 3 basics of a Rust program, 2024!");
        assert_eq!(tokens, vec!["basics", "rust", "program"]);
    }

    #[test]
    fn test_tokenize_unicode_word() {
        assert_eq!(tokenize("Théorie des ensembles"), vec!["théorie", "des", "ensembles"]);
    }

    #[test]
    fn test_vectorizer_tokens_keep_numbers_and_stop_words() {
        assert_eq!(
            vectorizer_tokens("The 3 basics of a Rust program, 2024!"),
            vec!["the", "basics", "of", "rust", "program", "2024"]
        );
        assert_eq!(vectorizer_tokens("C++ & R"), Vec::<String>::new());
        assert_eq!(vectorizer_tokens("Théorie des ensembles"), vec!["théorie", "des", "ensembles"]);
    }

    #[test]
    fn test_embed_batch_shapes() {
        let embedder = TfIdfEmbedder::default();
        let out = embedder
            .embed_batch(&["machine learning", "linear regression", "machine vision"])
            .unwrap();
        assert_eq!(out.len(), 3);
        // vocabulary: learning, linear, machine, regression, vision
        for emb in &out {
            assert_eq!(emb.dimension(), 5);
        }
    }

    #[test]
    fn test_embed_rows_are_normalized() {
        let embedder = TfIdfEmbedder::default();
        let out = embedder
            .embed_batch(&["deep learning", "learning rust"])
            .unwrap();
        for emb in &out {
            let norm: f32 = emb.values.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_shared_terms_increase_similarity() {
        let embedder = TfIdfEmbedder::default();
        let out = embedder
            .embed_batch(&["neural networks", "convolutional neural networks", "baroque music"])
            .unwrap();
        assert!(dot(&out[0], &out[1]) > dot(&out[0], &out[2]));
        assert!(dot(&out[0], &out[2]).abs() < 1e-6);
    }

    #[test]
    fn test_label_with_no_known_terms_is_zero() {
        let embedder = TfIdfEmbedder::default();
        let out = embedder.embed_batch(&["rust ownership", "C"]).unwrap();
        assert!(out[1].is_zero());
    }

    #[test]
    fn test_numbers_and_stop_words_are_terms() {
        let embedder = TfIdfEmbedder::default();
        let out = embedder.embed_batch(&["Python 3", "2024", "the and of"]).unwrap();
        assert!(!out[1].is_zero());
        assert!(!out[2].is_zero());
        // columns: 2024, and, of, python, the
        assert_eq!(out[0].dimension(), 5);
    }

    #[test]
    fn test_single_characters_only_fails() {
        let embedder = TfIdfEmbedder::default();
        let result = embedder.embed_batch(&["C", "R"]);
        assert!(matches!(result, Err(EmbeddingError::EmptyVocabulary(_))));
    }

    #[test]
    fn test_empty_batch() {
        let embedder = TfIdfEmbedder::default();
        assert!(embedder.embed_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_max_features_caps_vocabulary() {
        let embedder = TfIdfEmbedder::new(2);
        let out = embedder
            .embed_batch(&["rust rust python", "rust java", "python go"])
            .unwrap();
        // rust (3) and python (2) survive; java and go are dropped
        assert_eq!(out[0].dimension(), 2);
        assert!(out[2].values.iter().any(|v| *v > 0.0));
    }

    #[test]
    fn test_rare_term_outweighs_common_term() {
        let embedder = TfIdfEmbedder::default();
        let out = embedder
            .embed_batch(&["data cleaning", "data visualization", "data modeling"])
            .unwrap();
        // columns: cleaning, data, modeling, visualization
        let row = &out[0].values;
        assert!(row[0] > row[1]);
    }

    #[test]
    fn test_single_text_embed() {
        let embedder = TfIdfEmbedder::default();
        let emb = embedder.embed("graph theory").unwrap();
        assert_eq!(emb.dimension(), 2);
    }

    #[test]
    fn test_tfidf_top_terms_sorted() {
        let docs = vec![
            "rust rust rust systems",
            "python scripting",
            "rust memory safety",
        ];
        let tfidf = TfIdf::new(&docs);
        let top = tfidf.top_terms(3);
        assert_eq!(top[0].0, "rust");
        for i in 1..top.len() {
            assert!(top[i - 1].1 >= top[i].1);
        }
    }

    #[test]
    fn test_tfidf_nonexistent_term() {
        let tfidf = TfIdf::new(&["rust programming"]);
        assert_eq!(tfidf.score("nonexistent"), 0.0);
    }

    #[test]
    fn test_tfidf_empty_corpus() {
        let tfidf = TfIdf::new(&[]);
        assert_eq!(tfidf.score("rust"), 0.0);
        assert!(tfidf.top_terms(5).is_empty());
    }
}
