//! Shared test utilities
//!
//! Mock vendor servers run on ephemeral local ports so the gateway's vendor
//! clients can be exercised end to end without touching the network.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use devvoice::api::{self, ApiState, stream::StreamRegistry};
use devvoice::config::{GenerationConfig, TranscriptionConfig};
use devvoice::{ResponseGenerator, SpeechToText};
use serde_json::json;
use tokio::net::TcpListener;

/// Compose the gateway router the way the server does
pub fn build_router(state: Arc<ApiState>) -> Router {
    let api = Router::new()
        .merge(api::transcribe::router(state.clone()))
        .merge(api::chat::router(state.clone()))
        .merge(api::stream::router(state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api::rate_limit::rate_limit_middleware,
        ));

    Router::new()
        .nest("/api", api)
        .merge(api::health::router())
        .merge(api::health::ready_router(state))
}

/// Handler state with no vendors configured
pub fn unconfigured_state() -> Arc<ApiState> {
    Arc::new(ApiState {
        stt: None,
        generator: None,
        min_audio_bytes: 1000,
        streams: StreamRegistry::default(),
        rate_limiter: None,
    })
}

/// Handler state with both vendor clients pointed at mock servers
pub fn configured_state(speech_base: &str, generation_base: &str) -> Arc<ApiState> {
    Arc::new(ApiState {
        stt: Some(Arc::new(speech_client(speech_base, 5))),
        generator: Some(Arc::new(generation_client(generation_base))),
        min_audio_bytes: 1000,
        streams: StreamRegistry::default(),
        rate_limiter: None,
    })
}

/// Transcription client pointed at a mock vendor, polling fast
pub fn speech_client(base_url: &str, max_poll_attempts: u32) -> SpeechToText {
    let config = TranscriptionConfig {
        base_url: base_url.to_string(),
        poll_interval: Duration::from_millis(10),
        max_poll_attempts,
        ..TranscriptionConfig::default()
    };
    SpeechToText::new("test-key".to_string(), &config).expect("speech client")
}

/// Generation client pointed at a mock vendor
pub fn generation_client(base_url: &str) -> ResponseGenerator {
    let config = GenerationConfig {
        base_url: base_url.to_string(),
        ..GenerationConfig::default()
    };
    ResponseGenerator::new("test-key".to_string(), &config).expect("generation client")
}

/// Fixed transcript returned by the mock speech vendor
pub const MOCK_TRANSCRIPT: &str = "how do I reverse a string in python";

/// Behavior of the mock speech vendor
#[derive(Clone, Copy)]
pub enum SpeechVendorMode {
    /// Job completes on submission, no polling needed
    Immediate,
    /// Job is queued on submission and completes after this many polls
    CompletesAfter(u32),
    /// Job stays in processing forever
    NeverCompletes,
    /// Upload is rejected with 401
    RejectsAuth,
    /// Job completes with no recognized text
    CompletedEmpty,
}

/// A running mock speech vendor
pub struct MockSpeechVendor {
    pub base_url: String,
    polls: Arc<AtomicU32>,
}

impl MockSpeechVendor {
    /// Number of status polls the vendor has served
    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct SpeechVendorState {
    mode: SpeechVendorMode,
    polls: Arc<AtomicU32>,
}

/// Spawn a scripted speech vendor on an ephemeral port
pub async fn spawn_speech_vendor(mode: SpeechVendorMode) -> MockSpeechVendor {
    let polls = Arc::new(AtomicU32::new(0));
    let state = SpeechVendorState {
        mode,
        polls: polls.clone(),
    };

    let app = Router::new()
        .route("/v2/upload", post(vendor_upload))
        .route("/v2/transcript", post(vendor_submit))
        .route("/v2/transcript/{id}", get(vendor_status))
        .with_state(state);

    let base_url = serve_on_ephemeral_port(app).await;
    MockSpeechVendor { base_url, polls }
}

async fn vendor_upload(State(state): State<SpeechVendorState>) -> Response {
    match state.mode {
        SpeechVendorMode::RejectsAuth => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid api key" })),
        )
            .into_response(),
        _ => Json(json!({ "upload_url": "https://storage.invalid/audio-1" })).into_response(),
    }
}

async fn vendor_submit(State(state): State<SpeechVendorState>) -> Response {
    let body = match state.mode {
        SpeechVendorMode::Immediate => completed_job(MOCK_TRANSCRIPT, 0.91),
        SpeechVendorMode::CompletedEmpty => completed_job("", 0.0),
        _ => json!({
            "id": "job-1",
            "status": "queued",
            "text": null,
            "confidence": null,
            "error": null,
        }),
    };
    Json(body).into_response()
}

async fn vendor_status(
    State(state): State<SpeechVendorState>,
    Path(_id): Path<String>,
) -> Response {
    let served = state.polls.fetch_add(1, Ordering::SeqCst) + 1;
    let body = match state.mode {
        SpeechVendorMode::CompletesAfter(after) if served >= after => {
            completed_job(MOCK_TRANSCRIPT, 0.91)
        }
        _ => json!({
            "id": "job-1",
            "status": "processing",
            "text": null,
            "confidence": null,
            "error": null,
        }),
    };
    Json(body).into_response()
}

fn completed_job(text: &str, confidence: f64) -> serde_json::Value {
    json!({
        "id": "job-1",
        "status": "completed",
        "text": text,
        "confidence": confidence,
        "error": null,
    })
}

/// Fixed answer returned by the mock generation vendor
pub const MOCK_ANSWER: &str =
    "Use slicing: text[::-1] walks the string backwards and returns a reversed copy.";

/// Spawn a mock generation vendor; `healthy` controls whether it answers or
/// fails with a 500
pub async fn spawn_generation_vendor(healthy: bool) -> String {
    let app = Router::new().route(
        "/v1/chat",
        post(move || async move {
            if healthy {
                Json(json!({ "text": MOCK_ANSWER })).into_response()
            } else {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "model overloaded" })),
                )
                    .into_response()
            }
        }),
    );

    serve_on_ephemeral_port(app).await
}

/// Bind a router to 127.0.0.1:0 and serve it in the background
async fn serve_on_ephemeral_port(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// Encode a mono 16-bit WAV fixture of roughly `bytes` payload size
pub fn wav_fixture(bytes: usize) -> Vec<u8> {
    let samples = bytes / 2;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
        for i in 0..samples {
            let step = i16::try_from(i % 64).unwrap_or(0);
            writer.write_sample((step - 32) * 256).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}

/// Build a multipart body with a single field; returns (content-type, body)
pub fn multipart_body(field: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "devvoice-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"capture.webm\"\r\nContent-Type: audio/webm\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
