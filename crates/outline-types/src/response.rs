//! HTTP wire types.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/prompt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEnvelope {
    /// JSON-encoded request or free-text prompt
    pub prompt: String,
}

/// Reply to `POST /api/prompt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptResponse {
    pub success: bool,

    /// Outline serialized as a JSON string
    #[serde(
        rename = "generatedText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub generated_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PromptResponse {
    pub fn generated(text: String) -> Self {
        Self {
            success: true,
            generated_text: Some(text),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            generated_text: None,
            error: Some(message.into()),
        }
    }
}

/// Reply to `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub embedding_backend: String,
    pub clustering_backend: String,
}
