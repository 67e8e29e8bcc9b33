//! Error types for the `DevVoice` gateway

use thiserror::Error;

/// Result type alias for `DevVoice` operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the `DevVoice` gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing client input
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Vendor rejected the configured credentials
    #[error("vendor auth error: {0}")]
    VendorAuth(String),

    /// Vendor accepted the request but failed to process it
    #[error("vendor processing error: {0}")]
    VendorProcessing(String),

    /// Bounded status polling exhausted its attempts
    #[error("vendor timeout: {0}")]
    VendorTimeout(String),

    /// Pipeline state machine violation
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// HTTP status code this error maps to at the API boundary
    ///
    /// Validation failures are the caller's fault (400); everything else
    /// surfaces as an upstream failure (500).
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            _ => 500,
        }
    }

    /// Best-effort human-readable message for inline display in the demo UI
    ///
    /// Vendor errors arrive as free-form text; the mapping is substring
    /// matching, not a protocol.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::VendorAuth(_) => "Invalid API key configuration".to_string(),
            Self::VendorTimeout(_) => "Transcription timed out".to_string(),
            Self::Http(_) => "Network error - please check your connection".to_string(),
            Self::VendorProcessing(msg) => classify_vendor_message(msg),
            other => other.to_string(),
        }
    }
}

/// Map raw vendor error text to a user-facing message
fn classify_vendor_message(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if lower.contains("api key") || lower.contains("unauthorized") {
        "Invalid API key configuration".to_string()
    } else if lower.contains("network") || lower.contains("fetch") {
        "Network error - please check your connection".to_string()
    } else if lower.contains("format") || lower.contains("codec") {
        "Unsupported audio format".to_string()
    } else {
        raw.to_string()
    }
}
