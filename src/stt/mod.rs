//! Speech-to-text vendor integration
//!
//! The vendor accepts a reference URL rather than inline bytes, so every
//! transcription is a three-step flow: upload the audio, submit a job, poll
//! its status until it reaches a terminal state.

mod assemblyai;

pub use assemblyai::SpeechToText;

use serde::{Deserialize, Serialize};

/// A finished transcription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Recognized text; never empty (silence maps to a fixed placeholder)
    pub text: String,

    /// Vendor-reported confidence, 0.0 when absent
    pub confidence: f64,
}
