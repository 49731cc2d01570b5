//! # outline-types
//!
//! Shared domain types for the course outline service.
//!
//! - Requests: main topic, subtopics and topic count, parsed from JSON or
//!   from the front end's free-text prompt
//! - Outlines: the topic/lesson tree and the builder that fills it
//! - Wire types for the HTTP API
//! - Settings: layered configuration

pub mod config;
pub mod error;
pub mod outline;
pub mod prompt;
pub mod request;
pub mod response;

pub use config::{
    ClusterAlgorithm, ClusteringConfig, ComputeDevice, EmbeddingBackend, EmbeddingSettings,
    Settings,
};
pub use error::OutlineError;
pub use outline::{
    build_outline, CourseOutline, OutlineLayout, OutlineSubtopic, OutlineTopic,
    DEFAULT_SUBTOPICS_PER_TOPIC,
};
pub use request::{OutlineRequest, DEFAULT_NUM_TOPICS};
pub use response::{HealthResponse, PromptEnvelope, PromptResponse};
