//! Configuration management for the `DevVoice` gateway

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::{Error, Result};

/// Default API server port
pub const DEFAULT_PORT: u16 = 8787;

/// Minimum accepted audio payload in bytes; smaller captures are almost
/// certainly empty recordings and are rejected before any vendor call
pub const DEFAULT_MIN_AUDIO_BYTES: usize = 1000;

/// Fixed wait between transcription status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Bounded number of status polls before surfacing a timeout
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;

/// `DevVoice` gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API server configuration
    pub server: ServerConfig,

    /// Speech-to-text vendor configuration
    pub transcription: TranscriptionConfig,

    /// Text-generation vendor configuration
    pub generation: GenerationConfig,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Path to the static files directory (landing page + demo UI)
    pub static_dir: Option<PathBuf>,

    /// Requests-per-minute cap on the vendor proxies; `None` disables limiting
    pub rate_limit_per_minute: Option<u32>,
}

/// Speech-to-text vendor configuration
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    /// Vendor API key (from `ASSEMBLYAI_API_KEY`)
    pub api_key: Option<SecretString>,

    /// Vendor API base URL
    pub base_url: String,

    /// Speech model identifier sent with every job
    pub speech_model: String,

    /// Reject payloads smaller than this many bytes
    pub min_audio_bytes: usize,

    /// Wait between status polls
    pub poll_interval: Duration,

    /// Give up after this many status polls
    pub max_poll_attempts: u32,
}

/// Text-generation vendor configuration
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Vendor API key (from `COHERE_API_KEY`)
    pub api_key: Option<SecretString>,

    /// Vendor API base URL
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Output-length cap in tokens
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: Some(PathBuf::from("static")),
            rate_limit_per_minute: None,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.assemblyai.com".to_string(),
            speech_model: "best".to_string(),
            min_audio_bytes: DEFAULT_MIN_AUDIO_BYTES,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.cohere.com".to_string(),
            model: "command-r-plus".to_string(),
            max_tokens: 300,
            temperature: 0.7,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with an optional TOML
    /// overlay file
    ///
    /// The file (if present) fills in fields the environment leaves unset.
    ///
    /// # Errors
    ///
    /// Returns error if the overlay file is malformed or a value fails
    /// validation
    pub fn load() -> Result<Self> {
        let overlay = file::load_default()?.unwrap_or_default();
        Self::from_env_with_overlay(&overlay)
    }

    /// Build configuration from the environment and an explicit overlay
    ///
    /// # Errors
    ///
    /// Returns error if a value fails validation
    pub fn from_env_with_overlay(overlay: &file::ConfigFile) -> Result<Self> {
        let mut server = ServerConfig::default();
        let mut transcription = TranscriptionConfig::default();
        let mut generation = GenerationConfig::default();

        if let Some(port) = overlay.server.port {
            server.port = port;
        }
        if let Some(ref dir) = overlay.server.static_dir {
            server.static_dir = Some(PathBuf::from(dir));
        }
        if overlay.server.rate_limit_per_minute.is_some() {
            server.rate_limit_per_minute = overlay.server.rate_limit_per_minute;
        }

        if let Some(ref url) = overlay.transcription.base_url {
            transcription.base_url.clone_from(url);
        }
        if let Some(ref model) = overlay.transcription.speech_model {
            transcription.speech_model.clone_from(model);
        }
        if let Some(bytes) = overlay.transcription.min_audio_bytes {
            transcription.min_audio_bytes = bytes;
        }
        if let Some(secs) = overlay.transcription.poll_interval_secs {
            transcription.poll_interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = overlay.transcription.max_poll_attempts {
            transcription.max_poll_attempts = attempts;
        }
        if let Some(ref key) = overlay.api_keys.assemblyai {
            transcription.api_key = Some(SecretString::from(key.clone()));
        }

        if let Some(ref url) = overlay.generation.base_url {
            generation.base_url.clone_from(url);
        }
        if let Some(ref model) = overlay.generation.model {
            generation.model.clone_from(model);
        }
        if let Some(tokens) = overlay.generation.max_tokens {
            generation.max_tokens = tokens;
        }
        if let Some(temp) = overlay.generation.temperature {
            generation.temperature = temp;
        }
        if let Some(ref key) = overlay.api_keys.cohere {
            generation.api_key = Some(SecretString::from(key.clone()));
        }

        // Environment wins over the file; server flags (port, static dir,
        // rate limit) are owned by the CLI instead
        if let Ok(key) = std::env::var("ASSEMBLYAI_API_KEY") {
            if !key.is_empty() {
                transcription.api_key = Some(SecretString::from(key));
            }
        }
        if let Ok(key) = std::env::var("COHERE_API_KEY") {
            if !key.is_empty() {
                generation.api_key = Some(SecretString::from(key));
            }
        }

        let config = Self {
            server,
            transcription,
            generation,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges and URLs
    ///
    /// # Errors
    ///
    /// Returns error on out-of-range values or unparseable base URLs
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.transcription.base_url)
            .map_err(|e| Error::Config(format!("invalid transcription base URL: {e}")))?;
        url::Url::parse(&self.generation.base_url)
            .map_err(|e| Error::Config(format!("invalid generation base URL: {e}")))?;

        if self.transcription.max_poll_attempts == 0 {
            return Err(Error::Config(
                "max_poll_attempts must be at least 1".to_string(),
            ));
        }
        if self.generation.max_tokens == 0 {
            return Err(Error::Config("max_tokens must be at least 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(Error::Config(format!(
                "temperature {} out of range (0.0 to 2.0)",
                self.generation.temperature
            )));
        }
        Ok(())
    }
}
