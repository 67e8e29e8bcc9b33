//! Cohere-style chat completion client

use serde::{Deserialize, Serialize};

use super::SYSTEM_PROMPT;
use crate::config::GenerationConfig;
use crate::{Error, Result};

/// Chat completion request payload
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    message: &'a str,
    preamble: &'a str,
    temperature: f64,
    max_tokens: u32,
}

/// Chat completion response payload
#[derive(Debug, Deserialize)]
struct ChatResponse {
    text: String,
}

/// Generates spoken-aloud-appropriate answers through the hosted
/// text-generation API
pub struct ResponseGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl ResponseGenerator {
    /// Create a new generation client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, config: &GenerationConfig) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Cohere API key required for response generation".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Generate a response for a transcript
    ///
    /// Forwards the message with the fixed system instruction and sampling
    /// parameters; the vendor's text comes back verbatim. Failures are not
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VendorProcessing`] on any vendor failure
    pub async fn generate(&self, message: &str) -> Result<String> {
        tracing::debug!(chars = message.len(), model = %self.model, "starting generation");

        let request = ChatRequest {
            model: &self.model,
            message,
            preamble: SYSTEM_PROMPT,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "generation request failed");
                Error::VendorProcessing(
                    "Generation request failed. Please check the API configuration and try again."
                        .to_string(),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "generation API error");
            return Err(Error::VendorProcessing(
                "Generation request failed. Please check the API configuration and try again."
                    .to_string(),
            ));
        }

        let result: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse generation response");
            Error::VendorProcessing(
                "Generation request failed. Please check the API configuration and try again."
                    .to_string(),
            )
        })?;

        tracing::info!(chars = result.text.len(), "generation complete");
        Ok(result.text)
    }
}
