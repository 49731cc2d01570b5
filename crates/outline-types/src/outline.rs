//! Course outline structure.
//!
//! The outline is a single-key object: the lowercased course title mapping
//! to the list of topics. Each topic carries the same lesson slots, filled
//! from the requested subtopics and padded with generated placeholders.
//! Lesson content fields start empty and are filled in later by the
//! course writer.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::OutlineError;
use crate::request::OutlineRequest;

/// Lesson slots per topic used when nothing else is configured.
pub const DEFAULT_SUBTOPICS_PER_TOPIC: usize = 3;

/// Shape parameters for outline generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineLayout {
    /// Lessons emitted under every topic
    pub subtopics_per_topic: usize,
}

impl Default for OutlineLayout {
    fn default() -> Self {
        Self {
            subtopics_per_topic: DEFAULT_SUBTOPICS_PER_TOPIC,
        }
    }
}

/// A single lesson slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineSubtopic {
    pub title: String,
    pub theory: String,
    pub youtube: String,
    pub image: String,
    pub done: bool,
}

impl OutlineSubtopic {
    /// Create an unfilled lesson with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            theory: String::new(),
            youtube: String::new(),
            image: String::new(),
            done: false,
        }
    }
}

/// A topic and its lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineTopic {
    pub title: String,
    pub subtopics: Vec<OutlineSubtopic>,
}

/// The generated outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseOutline {
    /// Lowercased course title, used as the only key
    pub course: String,
    /// Topics in order
    pub topics: Vec<OutlineTopic>,
}

impl CourseOutline {
    /// Number of topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Whether the outline has no topics.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Serialize to compact JSON.
    pub fn to_json_string(&self) -> Result<String, OutlineError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, OutlineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Serialize for CourseOutline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.course, &self.topics)?;
        map.end()
    }
}

/// Build the outline for a request.
///
/// Topics are titled `Topic 1..=n`. Lesson `j` of every topic is the
/// caller's `j`-th subtopic when present, otherwise `Generated Subtopic
/// {j+1}`.
pub fn build_outline(request: &OutlineRequest, layout: &OutlineLayout) -> CourseOutline {
    let lessons: Vec<OutlineSubtopic> = (0..layout.subtopics_per_topic)
        .map(|j| match request.subtopics.get(j) {
            Some(title) => OutlineSubtopic::new(title.clone()),
            None => OutlineSubtopic::new(format!("Generated Subtopic {}", j + 1)),
        })
        .collect();

    let topics = (0..request.num_topics)
        .map(|i| OutlineTopic {
            title: format!("Topic {}", i + 1),
            subtopics: lessons.clone(),
        })
        .collect();

    CourseOutline {
        course: request.main_topic.to_lowercase(),
        topics,
    }
}
