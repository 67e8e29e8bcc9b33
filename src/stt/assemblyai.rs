//! `AssemblyAI`-style transcription client

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::Transcript;
use crate::config::TranscriptionConfig;
use crate::{Error, Result};

/// Text reported when the vendor completes with no recognized speech
const NO_SPEECH_TEXT: &str = "No speech detected";

/// Response from the audio upload endpoint
#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

/// Transcription job submission payload
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    audio_url: &'a str,
    speech_model: &'a str,
    language_detection: bool,
    punctuate: bool,
    format_text: bool,
}

/// Vendor-side job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

/// A transcription job as reported by the vendor
#[derive(Debug, Deserialize)]
struct TranscriptJob {
    id: String,
    status: JobStatus,
    text: Option<String>,
    confidence: Option<f64>,
    error: Option<String>,
}

/// Transcribes audio through the hosted speech-to-text API
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    speech_model: String,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl SpeechToText {
    /// Create a new transcription client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, config: &TranscriptionConfig) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "AssemblyAI API key required for transcription".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            speech_model: config.speech_model.clone(),
            poll_interval: config.poll_interval,
            max_poll_attempts: config.max_poll_attempts,
        })
    }

    /// Transcribe audio to text
    ///
    /// Uploads the bytes, submits a job, and polls at a fixed interval until
    /// the job completes, fails, or the attempt budget runs out.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VendorAuth`] on credential rejection,
    /// [`Error::VendorTimeout`] when polling exhausts its attempts, and
    /// [`Error::VendorProcessing`] on any other vendor failure
    pub async fn transcribe(&self, audio: &[u8]) -> Result<Transcript> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let upload_url = self.upload(audio).await?;
        tracing::debug!(upload_url = %upload_url, "audio uploaded");

        let mut job = self.submit(&upload_url).await?;
        tracing::debug!(job_id = %job.id, status = ?job.status, "transcription job submitted");

        if matches!(job.status, JobStatus::Queued | JobStatus::Processing) {
            job = self.poll(&job.id).await?;
        }

        if job.status == JobStatus::Error {
            let message = job
                .error
                .unwrap_or_else(|| "Transcription failed".to_string());
            tracing::error!(job_id = %job.id, error = %message, "vendor reported job failure");
            return Err(Error::VendorProcessing(message));
        }

        let text = job
            .text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| NO_SPEECH_TEXT.to_string());
        let confidence = job.confidence.unwrap_or(0.0);

        tracing::info!(transcript = %text, confidence, "transcription complete");
        Ok(Transcript { text, confidence })
    }

    /// Upload raw audio bytes, returning the vendor's reference URL
    async fn upload(&self, audio: &[u8]) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/v2/upload", self.base_url))
            .header("Authorization", &self.api_key)
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "audio upload request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "audio upload rejected");
            return Err(vendor_error(status, &body));
        }

        let result: UploadResponse = response.json().await?;
        Ok(result.upload_url)
    }

    /// Submit a transcription job for an uploaded clip
    async fn submit(&self, audio_url: &str) -> Result<TranscriptJob> {
        let request = SubmitRequest {
            audio_url,
            speech_model: &self.speech_model,
            language_detection: true,
            punctuate: true,
            format_text: true,
        };

        let response = self
            .client
            .post(format!("{}/v2/transcript", self.base_url))
            .header("Authorization", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "job submission request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "job submission rejected");
            return Err(vendor_error(status, &body));
        }

        Ok(response.json().await?)
    }

    /// Fetch the current state of a submitted job
    async fn fetch(&self, job_id: &str) -> Result<TranscriptJob> {
        let response = self
            .client
            .get(format!("{}/v2/transcript/{job_id}", self.base_url))
            .header("Authorization", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "status fetch rejected");
            return Err(vendor_error(status, &body));
        }

        Ok(response.json().await?)
    }

    /// Poll job status at a fixed interval until terminal or out of attempts
    async fn poll(&self, job_id: &str) -> Result<TranscriptJob> {
        for attempt in 1..=self.max_poll_attempts {
            tokio::time::sleep(self.poll_interval).await;

            let job = self.fetch(job_id).await?;
            tracing::debug!(attempt, status = ?job.status, "polled transcription status");

            if matches!(job.status, JobStatus::Completed | JobStatus::Error) {
                return Ok(job);
            }
        }

        Err(Error::VendorTimeout(format!(
            "transcription not completed after {} polls",
            self.max_poll_attempts
        )))
    }
}

/// Map a non-success vendor HTTP status to the error taxonomy
fn vendor_error(status: StatusCode, body: &str) -> Error {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        Error::VendorAuth(format!("speech API rejected credentials ({status})"))
    } else {
        Error::VendorProcessing(format!("speech API error {status}: {body}"))
    }
}
