//! HTTP routes.
//!
//! `POST /api/prompt` always answers 200 with a `success` flag, so the
//! browser client only has one response shape to handle.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info};

use outline_types::{HealthResponse, OutlineRequest, PromptEnvelope, PromptResponse};

use crate::error::ServiceError;
use crate::processor::OutlineProcessor;

type ProcessorState = Arc<OutlineProcessor>;

pub fn prompt_routes() -> Router<ProcessorState> {
    Router::new().route("/api/prompt", post(generate_outline))
}

pub fn health_routes() -> Router<ProcessorState> {
    Router::new().route("/health", get(health))
}

async fn generate_outline(
    State(processor): State<ProcessorState>,
    Json(envelope): Json<PromptEnvelope>,
) -> Json<PromptResponse> {
    match run_prompt(processor, envelope.prompt).await {
        Ok(text) => Json(PromptResponse::generated(text)),
        Err(e) => {
            error!(error = %e, "Prompt failed");
            Json(PromptResponse::failed(e.to_string()))
        }
    }
}

async fn run_prompt(processor: ProcessorState, prompt: String) -> Result<String, ServiceError> {
    let request = OutlineRequest::from_prompt(&prompt)?;
    info!(
        main_topic = %request.main_topic,
        subtopics = request.subtopics.len(),
        num_topics = request.num_topics,
        "Prompt received"
    );

    let processed = tokio::task::spawn_blocking(move || processor.process(request))
        .await
        .map_err(|e| ServiceError::Task(e.to_string()))??;

    Ok(processed.outline.to_json_string()?)
}

async fn health(State(processor): State<ProcessorState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        embedding_backend: processor.embedding_backend_name().to_string(),
        clustering_backend: processor.clustering_backend_name().to_string(),
    })
}
