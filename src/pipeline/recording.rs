//! Chunked recording buffer
//!
//! Chunks arrive in order while a capture is active and are joined into a
//! single clip on stop. The buffer is discarded after transcription
//! completes or fails; nothing is persisted.

use crate::{Error, Result};

/// A finalized audio capture ready for transcription
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Joined audio bytes
    pub data: Vec<u8>,

    /// MIME type reported by the capturing side
    pub mime: String,
}

/// Accumulates ordered audio chunks for one recording
#[derive(Debug)]
pub struct RecordingBuffer {
    chunks: Vec<Vec<u8>>,
    mime: String,
    active: bool,
}

impl RecordingBuffer {
    /// Start a new, active buffer
    #[must_use]
    pub fn new(mime: impl Into<String>) -> Self {
        Self {
            chunks: Vec::new(),
            mime: mime.into(),
            active: true,
        }
    }

    /// Append a chunk
    ///
    /// # Errors
    ///
    /// Returns error if the buffer was already finalized
    pub fn push_chunk(&mut self, chunk: Vec<u8>) -> Result<()> {
        if !self.active {
            return Err(Error::Pipeline(
                "chunk received after recording stopped".to_string(),
            ));
        }
        self.chunks.push(chunk);
        Ok(())
    }

    /// Total bytes accumulated so far
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Number of chunks accumulated so far
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the buffer is still accepting chunks
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// MIME type of the capture
    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Stop the capture and join all chunks into a single clip
    #[must_use]
    pub fn finalize(mut self) -> AudioClip {
        self.active = false;
        let mut data = Vec::with_capacity(self.byte_len());
        for chunk in self.chunks {
            data.extend_from_slice(&chunk);
        }
        AudioClip {
            data,
            mime: self.mime,
        }
    }
}
