//! Response generation proxy endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiState};
use crate::Error;

/// Build the chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(state)
}

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Transcript text to answer; missing and empty are treated alike
    #[serde(default)]
    pub message: Option<String>,
}

/// Chat response body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Generate an answer for a transcript
async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.unwrap_or_default();
    let message = message.trim();
    if message.is_empty() {
        return Err(Error::Validation("No message provided".to_string()).into());
    }

    let generator = state.generator.as_ref().ok_or(ApiError::NotConfigured(
        "Generation not configured (no generation API key)",
    ))?;

    tracing::info!(chars = message.len(), "chat request received");

    let response = generator.generate(message).await?;
    Ok(Json(ChatResponse { response }))
}
