//! Transcription proxy endpoint

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use super::{ApiError, ApiState};
use crate::Error;

/// Build the transcribe router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/transcribe", post(transcribe))
        .with_state(state)
}

/// Transcription response
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub transcript: String,
    pub confidence: f64,
}

/// Transcribe an uploaded audio capture
///
/// The multipart form field `audio` carries the binary payload. Undersized
/// payloads are rejected before any vendor call.
async fn transcribe(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut audio: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Validation(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("audio") {
            let data = field
                .bytes()
                .await
                .map_err(|e| Error::Validation(format!("failed to read audio field: {e}")))?;
            audio = Some(data.to_vec());
            break;
        }
    }

    let Some(audio) = audio else {
        tracing::warn!("transcription request without audio field");
        return Err(Error::Validation("No audio file provided".to_string()).into());
    };

    tracing::info!(bytes = audio.len(), "transcription request received");

    if audio.len() < state.min_audio_bytes {
        tracing::warn!(bytes = audio.len(), "rejecting undersized audio payload");
        return Err(Error::Validation("Audio file is too small or empty".to_string()).into());
    }

    let stt = state.stt.as_ref().ok_or(ApiError::NotConfigured(
        "Transcription not configured (no speech API key)",
    ))?;

    let transcript = stt.transcribe(&audio).await?;

    Ok(Json(TranscribeResponse {
        transcript: transcript.text,
        confidence: transcript.confidence,
    }))
}
