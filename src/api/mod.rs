//! HTTP API server for the `DevVoice` gateway

pub mod chat;
pub mod health;
pub mod rate_limit;
pub mod stream;
pub mod transcribe;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::llm::ResponseGenerator;
use crate::stt::SpeechToText;
use crate::{Error, Result};

/// Largest accepted audio upload
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared state for API handlers
pub struct ApiState {
    /// Transcription vendor client; `None` when no key is configured
    pub stt: Option<Arc<SpeechToText>>,

    /// Generation vendor client; `None` when no key is configured
    pub generator: Option<Arc<ResponseGenerator>>,

    /// Reject audio payloads smaller than this many bytes
    pub min_audio_bytes: usize,

    /// Open streaming transcription sessions
    pub streams: stream::StreamRegistry,

    /// Optional requests-per-minute cap on the vendor proxies
    pub rate_limiter: Option<rate_limit::SharedLimiter>,
}

impl ApiState {
    /// Build handler state from configuration
    ///
    /// # Errors
    ///
    /// Returns error if a configured vendor client fails to construct
    pub fn from_config(config: &Config) -> Result<Self> {
        let stt = config
            .transcription
            .api_key
            .as_ref()
            .map(|key| {
                SpeechToText::new(key.expose_secret().to_string(), &config.transcription)
            })
            .transpose()?
            .map(Arc::new);

        let generator = config
            .generation
            .api_key
            .as_ref()
            .map(|key| ResponseGenerator::new(key.expose_secret().to_string(), &config.generation))
            .transpose()?
            .map(Arc::new);

        if stt.is_none() {
            tracing::warn!("no speech API key configured; /api/transcribe will return 503");
        }
        if generator.is_none() {
            tracing::warn!("no generation API key configured; /api/chat will return 503");
        }

        Ok(Self {
            stt,
            generator,
            min_audio_bytes: config.transcription.min_audio_bytes,
            streams: stream::StreamRegistry::default(),
            rate_limiter: config
                .server
                .rate_limit_per_minute
                .map(rate_limit::create_limiter),
        })
    }
}

/// API error responses
///
/// Validation failures map to 400, unconfigured vendors to 503, everything
/// else to 500 with the best-effort user-facing message.
#[derive(Debug)]
pub enum ApiError {
    NotConfigured(&'static str),
    NotFound(&'static str),
    Gateway(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Gateway(err)
    }
}

/// JSON error body returned by every API failure
#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotConfigured(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_string()),
            Self::Gateway(err) => {
                let status = StatusCode::from_u16(err.http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, err.user_message())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Build a server from configuration
    ///
    /// # Errors
    ///
    /// Returns error if vendor clients fail to construct
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            state: Arc::new(ApiState::from_config(config)?),
            port: config.server.port,
            static_dir: config.server.static_dir.clone(),
        })
    }

    /// Shared handler state
    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        self.state.clone()
    }

    /// Build the router with all routes
    fn router(&self) -> Router {
        let api = Router::new()
            .merge(transcribe::router(self.state.clone()))
            .merge(chat::router(self.state.clone()))
            .merge(stream::router(self.state.clone()))
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
            .layer(axum::middleware::from_fn_with_state(
                self.state.clone(),
                rate_limit::rate_limit_middleware,
            ));

        let mut router = Router::new()
            .nest("/api", api)
            .merge(health::router())
            .merge(health::ready_router(self.state.clone()));

        // Serve the landing page if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        // CORS layer for cross-origin requests from embedded demos
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
