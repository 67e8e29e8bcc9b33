//! TOML configuration file loading
//!
//! Supports `~/.config/devvoice/config.toml` as a persistent config source.
//! All fields are optional - the file is a partial overlay underneath the
//! environment.

use std::path::PathBuf;

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Speech-to-text vendor configuration
    #[serde(default)]
    pub transcription: TranscriptionFileConfig,

    /// Text-generation vendor configuration
    #[serde(default)]
    pub generation: GenerationFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Server configuration section
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Port to listen on
    pub port: Option<u16>,

    /// Static files directory (landing page)
    pub static_dir: Option<String>,

    /// Requests-per-minute cap on the vendor proxies
    pub rate_limit_per_minute: Option<u32>,
}

/// Speech-to-text configuration section
#[derive(Debug, Default, Deserialize)]
pub struct TranscriptionFileConfig {
    /// Vendor API base URL
    pub base_url: Option<String>,

    /// Speech model identifier (e.g. "best")
    pub speech_model: Option<String>,

    /// Minimum accepted audio payload in bytes
    pub min_audio_bytes: Option<usize>,

    /// Seconds between status polls
    pub poll_interval_secs: Option<u64>,

    /// Give up after this many status polls
    pub max_poll_attempts: Option<u32>,
}

/// Text-generation configuration section
#[derive(Debug, Default, Deserialize)]
pub struct GenerationFileConfig {
    /// Vendor API base URL
    pub base_url: Option<String>,

    /// Model identifier (e.g. "command-r-plus")
    pub model: Option<String>,

    /// Output-length cap in tokens
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    pub temperature: Option<f64>,
}

/// API keys configuration section
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub assemblyai: Option<String>,
    pub cohere: Option<String>,
}

/// Default config file location (`~/.config/devvoice/config.toml`)
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "DevVoice", "devvoice")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load the overlay from the default location, or from `DEVVOICE_CONFIG`
/// when set
///
/// A missing file is not an error; a malformed one is.
///
/// # Errors
///
/// Returns error if the file exists but cannot be read or parsed
pub fn load_default() -> Result<Option<ConfigFile>> {
    let path = std::env::var("DEVVOICE_CONFIG")
        .ok()
        .map(PathBuf::from)
        .or_else(default_path);

    let Some(path) = path else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }

    load_path(&path).map(Some)
}

/// Load and parse an overlay file
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_path(path: &std::path::Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let parsed = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "loaded config overlay");
    Ok(parsed)
}
