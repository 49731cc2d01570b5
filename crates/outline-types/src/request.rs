//! Outline request type.
//!
//! A request names the course (`main_topic`), the lessons the caller wants
//! covered (`subtopics`), and how many topics the outline should have.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::OutlineError;

/// Topic count used when the caller does not specify one.
pub const DEFAULT_NUM_TOPICS: usize = 5;

fn default_num_topics() -> usize {
    DEFAULT_NUM_TOPICS
}

/// A request for a course outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineRequest {
    /// Course title
    pub main_topic: String,

    /// Lessons the caller wants included, in order
    #[serde(default)]
    pub subtopics: Vec<String>,

    /// Number of topics in the outline.
    /// Accepts a JSON number or a numeric string.
    #[serde(
        default = "default_num_topics",
        deserialize_with = "deserialize_topic_count"
    )]
    pub num_topics: usize,
}

impl OutlineRequest {
    /// Create a request.
    pub fn new(
        main_topic: impl Into<String>,
        subtopics: Vec<String>,
        num_topics: usize,
    ) -> Self {
        Self {
            main_topic: main_topic.into(),
            subtopics,
            num_topics,
        }
    }

    /// Parse the JSON form of a request.
    pub fn from_prompt_json(text: &str) -> Result<Self, OutlineError> {
        serde_json::from_str(text).map_err(|e| OutlineError::Prompt(e.to_string()))
    }

    /// Trim labels and drop subtopics that are blank.
    pub fn normalize(mut self) -> Self {
        self.main_topic = self.main_topic.trim().to_string();
        self.subtopics = self
            .subtopics
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    /// Check the request against service limits.
    pub fn validate(&self, max_topics: usize) -> Result<(), OutlineError> {
        if self.main_topic.trim().is_empty() {
            return Err(OutlineError::InvalidInput(
                "main_topic must not be empty".to_string(),
            ));
        }
        if self.num_topics > max_topics {
            return Err(OutlineError::InvalidInput(format!(
                "num_topics must be at most {}, got {}",
                max_topics, self.num_topics
            )));
        }
        Ok(())
    }

    /// Labels that get embedded: the main topic followed by each subtopic.
    pub fn labels(&self) -> Vec<String> {
        std::iter::once(self.main_topic.clone())
            .chain(self.subtopics.iter().cloned())
            .collect()
    }
}

/// Accept `5`, `5.0` or `"5"` but reject negatives and fractions.
fn deserialize_topic_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match RawCount::deserialize(deserializer)? {
        RawCount::Int(n) => usize::try_from(n)
            .map_err(|_| de::Error::custom(format!("num_topics must not be negative, got {n}"))),
        RawCount::Float(f) => {
            if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
                Ok(f as usize)
            } else {
                Err(de::Error::custom(format!(
                    "num_topics must be a whole number, got {f}"
                )))
            }
        }
        RawCount::Text(s) => s.trim().parse::<usize>().map_err(|_| {
            de::Error::custom(format!("num_topics must be a whole number, got {s:?}"))
        }),
    }
}
