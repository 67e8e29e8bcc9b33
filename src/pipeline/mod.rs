//! Session-scoped voice pipeline
//!
//! One cycle runs strictly sequentially: capture, transcribe, generate,
//! speak. [`VoiceSession`] guards the transitions; an epoch counter drops
//! results that arrive after a newer cycle has started. In-flight vendor
//! requests are never aborted - a late response is simply ignored.

mod recording;

pub use recording::{AudioClip, RecordingBuffer};

use crate::llm::ResponseGenerator;
use crate::stt::{SpeechToText, Transcript};
use crate::{Error, Result};

/// Inline message shown when a capture is rejected before upload
pub const AUDIO_TOO_SMALL: &str = "Audio file is too small or empty";

/// Phase of one voice cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Recording,
    Transcribing,
    Generating,
    Speaking,
    /// Terminal for the cycle; cleared by dismissal or the next action
    Error(String),
}

/// State machine for the record -> transcribe -> generate -> speak cycle
///
/// All fields are transient and overwritten by the next cycle; nothing
/// survives a restart.
#[derive(Debug)]
pub struct VoiceSession {
    phase: Phase,
    recording: Option<RecordingBuffer>,
    transcript: Option<Transcript>,
    response: Option<String>,
    epoch: u64,
    min_audio_bytes: usize,
}

impl VoiceSession {
    /// Create an idle session
    #[must_use]
    pub const fn new(min_audio_bytes: usize) -> Self {
        Self {
            phase: Phase::Idle,
            recording: None,
            transcript: None,
            response: None,
            epoch: 0,
            min_audio_bytes,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Epoch of the current cycle; results tagged with an older epoch are
    /// stale and must be dropped
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Transcript of the current cycle, if one has been accepted
    #[must_use]
    pub const fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    /// Assistant response of the current cycle, if one has been accepted
    #[must_use]
    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    /// Begin a new recording, superseding whatever cycle was in progress
    ///
    /// Starting a cycle clears a pending error automatically and bumps the
    /// epoch so any still-in-flight vendor result from the old cycle is
    /// dropped on arrival.
    ///
    /// # Errors
    ///
    /// Returns error if a recording is already active - at most one at a
    /// time
    pub fn start_recording(&mut self, mime: impl Into<String>) -> Result<u64> {
        if self.phase == Phase::Recording {
            return Err(Error::Pipeline(
                "a recording session is already active".to_string(),
            ));
        }

        self.epoch += 1;
        self.transcript = None;
        self.response = None;
        self.recording = Some(RecordingBuffer::new(mime));
        self.phase = Phase::Recording;
        tracing::debug!(epoch = self.epoch, "recording started");
        Ok(self.epoch)
    }

    /// Append an audio chunk to the active recording
    ///
    /// # Errors
    ///
    /// Returns error if no recording is active
    pub fn push_chunk(&mut self, chunk: Vec<u8>) -> Result<()> {
        match self.recording.as_mut() {
            Some(buffer) if self.phase == Phase::Recording => buffer.push_chunk(chunk),
            _ => Err(Error::Pipeline("no active recording".to_string())),
        }
    }

    /// Stop the recording and move to transcribing
    ///
    /// The finalized clip is handed to the caller for upload; the session
    /// keeps no copy of the audio.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the capture is below the minimum
    /// size (the session moves to the error phase), or a pipeline error if
    /// no recording is active
    pub fn stop_recording(&mut self) -> Result<AudioClip> {
        if self.phase != Phase::Recording {
            return Err(Error::Pipeline("no active recording".to_string()));
        }
        let buffer = self
            .recording
            .take()
            .ok_or_else(|| Error::Pipeline("no active recording".to_string()))?;

        let clip = buffer.finalize();
        if clip.data.len() < self.min_audio_bytes {
            self.phase = Phase::Error(AUDIO_TOO_SMALL.to_string());
            return Err(Error::Validation(AUDIO_TOO_SMALL.to_string()));
        }

        self.phase = Phase::Transcribing;
        tracing::debug!(bytes = clip.data.len(), "recording stopped");
        Ok(clip)
    }

    /// Accept a transcription result
    ///
    /// Returns `false` when the result belongs to a superseded cycle and was
    /// dropped. On acceptance the session moves to generating - a transcript
    /// is guaranteed to exist before any generation request is issued.
    ///
    /// # Errors
    ///
    /// Returns error if the session is not transcribing
    pub fn accept_transcript(&mut self, epoch: u64, transcript: Transcript) -> Result<bool> {
        if epoch != self.epoch {
            tracing::debug!(stale = epoch, current = self.epoch, "dropping stale transcript");
            return Ok(false);
        }
        if self.phase != Phase::Transcribing {
            return Err(Error::Pipeline(format!(
                "transcript not expected in phase {:?}",
                self.phase
            )));
        }

        self.transcript = Some(transcript);
        self.phase = Phase::Generating;
        Ok(true)
    }

    /// Accept a generated response
    ///
    /// Returns `false` when the result belongs to a superseded cycle. On
    /// acceptance the session moves to speaking.
    ///
    /// # Errors
    ///
    /// Returns error if the session is not generating or has no transcript
    pub fn accept_response(&mut self, epoch: u64, response: String) -> Result<bool> {
        if epoch != self.epoch {
            tracing::debug!(stale = epoch, current = self.epoch, "dropping stale response");
            return Ok(false);
        }
        if self.phase != Phase::Generating || self.transcript.is_none() {
            return Err(Error::Pipeline(format!(
                "response not expected in phase {:?}",
                self.phase
            )));
        }

        self.response = Some(response);
        self.phase = Phase::Speaking;
        Ok(true)
    }

    /// Playback finished or was canceled; return to idle
    pub fn finish_speaking(&mut self) {
        if self.phase == Phase::Speaking {
            self.phase = Phase::Idle;
        }
    }

    /// Record a failure; the cycle ends and the error is shown inline
    pub fn fail(&mut self, message: impl Into<String>) {
        self.recording = None;
        self.phase = Phase::Error(message.into());
    }

    /// User dismissed the inline error
    pub fn dismiss_error(&mut self) {
        if matches!(self.phase, Phase::Error(_)) {
            self.phase = Phase::Idle;
        }
    }
}

/// Outcome of one full pipeline run
#[derive(Debug)]
pub struct PipelineOutcome {
    pub transcript: Transcript,
    pub response: String,
}

/// Sequential clip -> transcript -> response orchestrator
///
/// Backs the `devvoice ask` CLI command; the browser demo drives the same
/// two proxies over HTTP instead.
pub struct Pipeline {
    stt: SpeechToText,
    generator: ResponseGenerator,
    min_audio_bytes: usize,
}

impl Pipeline {
    /// Create a pipeline over configured vendor clients
    #[must_use]
    pub const fn new(
        stt: SpeechToText,
        generator: ResponseGenerator,
        min_audio_bytes: usize,
    ) -> Self {
        Self {
            stt,
            generator,
            min_audio_bytes,
        }
    }

    /// Run one clip through transcription and generation
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for undersized clips (the vendor is
    /// never called) or the underlying vendor error
    pub async fn run_clip(&self, clip: &AudioClip) -> Result<PipelineOutcome> {
        if clip.data.len() < self.min_audio_bytes {
            return Err(Error::Validation(AUDIO_TOO_SMALL.to_string()));
        }

        let transcript = self.stt.transcribe(&clip.data).await?;
        let response = self.generator.generate(&transcript.text).await?;

        Ok(PipelineOutcome {
            transcript,
            response,
        })
    }
}
