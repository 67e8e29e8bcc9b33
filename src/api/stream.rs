//! Streaming transcription sessions
//!
//! A session is opened with a POST, audio chunks arrive as raw bodies, and
//! transcript updates flow back over a server-sent-event stream. Sessions
//! live only in memory; closing one removes it.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use tokio::sync::{RwLock, mpsc};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use super::{ApiError, ApiState};
use crate::stt::SpeechToText;

/// Event channel depth per session
const EVENT_BUFFER: usize = 32;

/// Events pushed on the transcription stream
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    SessionOpened { session_id: Uuid },
    Transcript { text: String, confidence: f64 },
    Error { error: String },
    SessionClosed,
}

/// One open streaming session
struct StreamSession {
    sender: mpsc::Sender<StreamEvent>,
    /// Taken by the first (only) event subscriber
    receiver: Option<mpsc::Receiver<StreamEvent>>,
    buffer: Vec<u8>,
    /// A transcription pass over the buffer is in flight
    transcribing: bool,
    opened_at: DateTime<Utc>,
}

/// In-memory registry of open streaming sessions
#[derive(Clone, Default)]
pub struct StreamRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, StreamSession>>>,
}

impl StreamRegistry {
    /// Open a new session
    pub async fn open(&self) -> (Uuid, DateTime<Utc>) {
        let (sender, receiver) = mpsc::channel(EVENT_BUFFER);
        let id = Uuid::new_v4();
        let opened_at = Utc::now();

        self.sessions.write().await.insert(
            id,
            StreamSession {
                sender,
                receiver: Some(receiver),
                buffer: Vec::new(),
                transcribing: false,
                opened_at,
            },
        );

        tracing::debug!(session_id = %id, "stream session opened");
        (id, opened_at)
    }

    /// Take the event receiver for a session
    ///
    /// The `session_opened` event is queued immediately so it is the first
    /// thing the subscriber sees. Returns `None` for unknown sessions or
    /// when the stream was already claimed.
    pub async fn subscribe(&self, id: Uuid) -> Option<mpsc::Receiver<StreamEvent>> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id)?;
        let receiver = session.receiver.take()?;
        push_event(&session.sender, StreamEvent::SessionOpened { session_id: id });
        Some(receiver)
    }

    /// Append a chunk to a session's buffer
    ///
    /// Returns the total buffered bytes plus a copy of the buffer when a
    /// new transcription pass should start (threshold crossed and no pass
    /// already in flight). Returns `None` for unknown sessions.
    pub async fn append(
        &self,
        id: Uuid,
        chunk: &[u8],
        min_bytes: usize,
    ) -> Option<(usize, Option<Vec<u8>>)> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id)?;

        session.buffer.extend_from_slice(chunk);
        let total = session.buffer.len();

        let job = if total >= min_bytes && !session.transcribing {
            session.transcribing = true;
            Some(session.buffer.clone())
        } else {
            None
        };

        Some((total, job))
    }

    /// Deliver the result of a transcription pass and allow the next one
    pub async fn finish_pass(&self, id: Uuid, event: StreamEvent) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(&id) {
            session.transcribing = false;
            push_event(&session.sender, event);
        }
    }

    /// Close and remove a session, emitting `session_closed`
    ///
    /// Dropping the sender afterwards ends the subscriber's stream.
    pub async fn close(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(session) => {
                push_event(&session.sender, StreamEvent::SessionClosed);
                tracing::debug!(session_id = %id, "stream session closed");
                true
            }
            None => false,
        }
    }

    /// When the session was opened, if it exists
    pub async fn opened_at(&self, id: Uuid) -> Option<DateTime<Utc>> {
        self.sessions.read().await.get(&id).map(|s| s.opened_at)
    }

    /// Number of open sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are open
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Queue an event without blocking; a slow or gone subscriber loses events
fn push_event(sender: &mpsc::Sender<StreamEvent>, event: StreamEvent) {
    if let Err(e) = sender.try_send(event) {
        tracing::warn!(error = %e, "dropping stream event");
    }
}

/// Build the streaming router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/stream/sessions", post(open_session))
        .route("/stream/sessions/{id}/events", get(events))
        .route("/stream/sessions/{id}/audio", post(append_audio))
        .route("/stream/sessions/{id}", delete(close_session))
        .with_state(state)
}

/// Session creation response
#[derive(Debug, Serialize)]
pub struct OpenSessionResponse {
    pub session_id: Uuid,
    pub opened_at: DateTime<Utc>,
}

/// Open a streaming transcription session
async fn open_session(State(state): State<Arc<ApiState>>) -> Json<OpenSessionResponse> {
    let (session_id, opened_at) = state.streams.open().await;
    Json(OpenSessionResponse {
        session_id,
        opened_at,
    })
}

/// Subscribe to a session's event stream
async fn events(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, StatusCode> {
    let receiver = state
        .streams
        .subscribe(id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let stream = ReceiverStream::new(receiver).map(|event| Event::default().json_data(&event));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Chunk acceptance response
#[derive(Debug, Serialize)]
pub struct AppendResponse {
    pub buffered_bytes: usize,
}

/// Append an audio chunk to a session
///
/// Once the buffer crosses the minimum audio size the accumulated capture
/// is re-transcribed and the latest text is pushed to the event stream.
async fn append_audio(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<AppendResponse>, ApiError> {
    let stt = state.stt.as_ref().ok_or(ApiError::NotConfigured(
        "Transcription not configured (no speech API key)",
    ))?;

    let (buffered_bytes, job) = state
        .streams
        .append(id, &body, state.min_audio_bytes)
        .await
        .ok_or(ApiError::NotFound("unknown stream session"))?;

    if let Some(audio) = job {
        tokio::spawn(run_transcription(
            state.streams.clone(),
            stt.clone(),
            id,
            audio,
        ));
    }

    Ok(Json(AppendResponse { buffered_bytes }))
}

/// Close a session
async fn close_session(State(state): State<Arc<ApiState>>, Path(id): Path<Uuid>) -> StatusCode {
    if state.streams.close(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Transcribe a buffered capture and push the outcome to the stream
async fn run_transcription(
    streams: StreamRegistry,
    stt: Arc<SpeechToText>,
    id: Uuid,
    audio: Vec<u8>,
) {
    let event = match stt.transcribe(&audio).await {
        Ok(transcript) => StreamEvent::Transcript {
            text: transcript.text,
            confidence: transcript.confidence,
        },
        Err(e) => {
            tracing::error!(session_id = %id, error = %e, "stream transcription failed");
            StreamEvent::Error {
                error: e.user_message(),
            }
        }
    };

    streams.finish_pass(id, event).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_queues_session_opened_first() {
        let registry = StreamRegistry::default();
        let (id, _) = registry.open().await;

        let mut receiver = registry.subscribe(id).await.unwrap();
        let event = receiver.recv().await.unwrap();
        assert!(matches!(event, StreamEvent::SessionOpened { session_id } if session_id == id));
    }

    #[tokio::test]
    async fn second_subscriber_is_rejected() {
        let registry = StreamRegistry::default();
        let (id, _) = registry.open().await;

        assert!(registry.subscribe(id).await.is_some());
        assert!(registry.subscribe(id).await.is_none());
    }

    #[tokio::test]
    async fn append_triggers_one_pass_at_a_time() {
        let registry = StreamRegistry::default();
        let (id, _) = registry.open().await;

        // Below threshold: buffered, no pass
        let (total, job) = registry.append(id, &[0u8; 400], 1000).await.unwrap();
        assert_eq!(total, 400);
        assert!(job.is_none());

        // Crosses threshold: pass starts with the whole buffer
        let (total, job) = registry.append(id, &[0u8; 700], 1000).await.unwrap();
        assert_eq!(total, 1100);
        assert_eq!(job.unwrap().len(), 1100);

        // Pass in flight: more audio buffers without a second pass
        let (_, job) = registry.append(id, &[0u8; 100], 1000).await.unwrap();
        assert!(job.is_none());

        // Pass finished: the next chunk starts a new one
        registry
            .finish_pass(
                id,
                StreamEvent::Transcript {
                    text: "hello".to_string(),
                    confidence: 0.9,
                },
            )
            .await;
        let (_, job) = registry.append(id, &[0u8; 100], 1000).await.unwrap();
        assert_eq!(job.unwrap().len(), 1300);
    }

    #[tokio::test]
    async fn close_emits_session_closed_and_removes() {
        let registry = StreamRegistry::default();
        let (id, _) = registry.open().await;
        let mut receiver = registry.subscribe(id).await.unwrap();

        assert!(registry.close(id).await);
        assert!(!registry.close(id).await);
        assert_eq!(registry.len().await, 0);

        // session_opened then session_closed, then the stream ends
        assert!(matches!(
            receiver.recv().await,
            Some(StreamEvent::SessionOpened { .. })
        ));
        assert!(matches!(receiver.recv().await, Some(StreamEvent::SessionClosed)));
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn unknown_sessions_are_absent() {
        let registry = StreamRegistry::default();
        let id = Uuid::new_v4();

        assert!(registry.subscribe(id).await.is_none());
        assert!(registry.append(id, &[0u8; 10], 1000).await.is_none());
        assert!(registry.opened_at(id).await.is_none());
        assert!(!registry.close(id).await);
    }

    #[test]
    fn events_serialize_with_type_tags() {
        let opened = StreamEvent::SessionOpened {
            session_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&opened).unwrap();
        assert_eq!(json["type"], "session_opened");

        let transcript = StreamEvent::Transcript {
            text: "hi".to_string(),
            confidence: 0.5,
        };
        let json = serde_json::to_value(&transcript).unwrap();
        assert_eq!(json["type"], "transcript");
        assert_eq!(json["text"], "hi");

        let closed = serde_json::to_value(&StreamEvent::SessionClosed).unwrap();
        assert_eq!(closed["type"], "session_closed");
    }
}
