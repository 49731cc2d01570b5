//! Prompt interpretation.
//!
//! The web front end sends either a JSON-encoded [`OutlineRequest`] or the
//! free-text generation prompt it builds for the course writer, e.g.
//! `Generate a list of Strict 4 topics and any number sub topic for each
//! topic for main title Rust, ... include these topics :- Ownership, Traits.`

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::OutlineError;
use crate::request::{OutlineRequest, DEFAULT_NUM_TOPICS};

static MAIN_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"main title (.*?),").expect("valid main title pattern"));

static TOPIC_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Strict ([0-9]+) topics").expect("valid topic count pattern"));

static SUBTOPIC_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"include these topics :- (.*?)\.").expect("valid subtopic list pattern")
});

impl OutlineRequest {
    /// Extract a request from a free-text prompt.
    ///
    /// Missing pieces fall back to an empty title, [`DEFAULT_NUM_TOPICS`]
    /// topics and no subtopics. A count too large for `usize` is rejected.
    pub fn from_prompt_text(text: &str) -> Result<Self, OutlineError> {
        let main_topic = MAIN_TITLE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let num_topics = match TOPIC_COUNT.captures(text).and_then(|c| c.get(1)) {
            Some(m) => m.as_str().parse::<usize>().map_err(|_| {
                OutlineError::Prompt(format!("topic count out of range: {}", m.as_str()))
            })?,
            None => DEFAULT_NUM_TOPICS,
        };

        let subtopics = SUBTOPIC_LIST
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            main_topic,
            subtopics,
            num_topics,
        })
    }

    /// Interpret a prompt string: JSON object first, free text otherwise.
    pub fn from_prompt(text: &str) -> Result<Self, OutlineError> {
        if text.trim_start().starts_with('{') {
            return Self::from_prompt_json(text);
        }
        debug!("Prompt is not JSON, extracting fields from text");
        Self::from_prompt_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "Generate a list of Strict 4 topics and any number sub topic for each \
        topic for main title Machine Learning, everything in single line. \
        Those 4 topics should Strictly include these topics :- Regression, Clustering, Trees. \
        Strictly Keep theory, youtube, image field empty.";

    #[test]
    fn test_extract_all_fields() {
        let req = OutlineRequest::from_prompt_text(PROMPT).unwrap();
        assert_eq!(req.main_topic, "Machine Learning");
        assert_eq!(req.num_topics, 4);
        assert_eq!(req.subtopics, vec!["Regression", "Clustering", "Trees"]);
    }

    #[test]
    fn test_extract_defaults() {
        let req = OutlineRequest::from_prompt_text("nothing useful here").unwrap();
        assert_eq!(req.main_topic, "");
        assert_eq!(req.num_topics, DEFAULT_NUM_TOPICS);
        assert!(req.subtopics.is_empty());
    }

    #[test]
    fn test_extract_count_overflow() {
        let err = OutlineRequest::from_prompt_text("Strict 99999999999999999999999 topics")
            .unwrap_err();
        assert!(matches!(err, OutlineError::Prompt(_)));
    }

    #[test]
    fn test_from_prompt_prefers_json() {
        let req = OutlineRequest::from_prompt(r#" {"main_topic":"Rust","num_topics":2}"#).unwrap();
        assert_eq!(req.main_topic, "Rust");
        assert_eq!(req.num_topics, 2);
    }

    #[test]
    fn test_from_prompt_falls_back_to_text() {
        let req = OutlineRequest::from_prompt(PROMPT).unwrap();
        assert_eq!(req.main_topic, "Machine Learning");
    }

    #[test]
    fn test_from_prompt_bad_json_is_error() {
        assert!(OutlineRequest::from_prompt("{not json").is_err());
    }
}
