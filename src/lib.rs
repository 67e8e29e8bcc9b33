//! `DevVoice` Gateway - voice demo gateway for the `DevVoice` landing page
//!
//! This library provides the core functionality of the gateway:
//! - Vendor proxies for speech-to-text (upload, submit, poll) and text
//!   generation (fixed-prompt chat completion)
//! - The session-scoped voice pipeline state machine
//! - Speech playback planning (voice selection, word-highlight timeline)
//! - The HTTP server that hosts the landing page and the demo API
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      Browser                         │
//! │   capture  │  demo UI  │  speech synthesis          │
//! └────────────────────┬────────────────────────────────┘
//!                      │  /api/transcribe  /api/chat  SSE
//! ┌────────────────────▼────────────────────────────────┐
//! │                 DevVoice Gateway                     │
//! │   static pages  │  vendor proxies  │  streaming     │
//! └────────────────────┬────────────────────────────────┘
//!                      │  HTTPS
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Hosted AI vendors                    │
//! │   speech-to-text   │   text generation              │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod speech;
pub mod stt;

pub use config::Config;
pub use error::{Error, Result};
pub use llm::{ResponseGenerator, SYSTEM_PROMPT};
pub use pipeline::{AudioClip, Phase, Pipeline, RecordingBuffer, VoiceSession};
pub use speech::{PlaybackSession, VoiceInfo, WordTimeline, select_voice};
pub use stt::{SpeechToText, Transcript};
