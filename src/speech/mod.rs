//! Speech playback planning
//!
//! The browser does the actual speaking via its speech-synthesis built-in;
//! this module owns the deterministic parts the demo UI mirrors: voice
//! selection, the coarse word-highlight timeline, and cancelable playback
//! state.

use std::time::Duration;

/// Assumed speaking rate for duration estimation
pub const WORDS_PER_MINUTE: f64 = 150.0;

/// Voice names tried in order before falling back to any English voice
pub const PREFERRED_VOICES: [&str; 3] = ["Google US English", "Samantha", "Daniel"];

/// A synthesis voice as reported by the platform
#[derive(Debug, Clone)]
pub struct VoiceInfo {
    pub name: String,
    pub lang: String,
    pub default_voice: bool,
}

/// Pick a voice by best-effort heuristic name matching
///
/// Case-insensitive substring match of the preferred names in order, then
/// any English voice, then the platform default, then whatever is first.
/// Never a guaranteed selection.
#[must_use]
pub fn select_voice<'a>(voices: &'a [VoiceInfo], preferred: &[&str]) -> Option<&'a VoiceInfo> {
    for want in preferred {
        let want = want.to_lowercase();
        if let Some(voice) = voices
            .iter()
            .find(|v| v.name.to_lowercase().contains(&want))
        {
            return Some(voice);
        }
    }

    voices
        .iter()
        .find(|v| v.lang.to_lowercase().starts_with("en"))
        .or_else(|| voices.iter().find(|v| v.default_voice))
        .or_else(|| voices.first())
}

/// Estimate how long the text takes to speak at the fixed rate
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn estimate_duration(text: &str) -> Duration {
    let words = text.split_whitespace().count();
    if words == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(words as f64 * 60.0 / WORDS_PER_MINUTE)
}

/// Coarse word-by-word highlight timeline
///
/// Divides the estimated total duration evenly across the word count. This
/// is a timer estimate, not phoneme timing - cosmetic only.
#[derive(Debug, Clone)]
pub struct WordTimeline {
    words: Vec<String>,
    slot: Duration,
}

impl WordTimeline {
    /// Build a timeline for `text` spoken over `total`
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(text: &str, total: Duration) -> Self {
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let slot = if words.is_empty() {
            Duration::ZERO
        } else {
            total / words.len() as u32
        };
        Self { words, slot }
    }

    /// The words in speaking order
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Number of words
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the timeline has no words
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Time allotted to each word
    #[must_use]
    pub const fn slot(&self) -> Duration {
        self.slot
    }

    /// Highlight index at `elapsed`, or `None` once playback is past the end
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn word_at(&self, elapsed: Duration) -> Option<usize> {
        if self.words.is_empty() || self.slot.is_zero() {
            return None;
        }
        let index = (elapsed.as_nanos() / self.slot.as_nanos()) as usize;
        (index < self.words.len()).then_some(index)
    }
}

/// Cancelable playback state
///
/// Mirrors the browser-side utterance lifecycle: starting cancels whatever
/// was playing, ticking advances the highlight, canceling silences
/// instantly and resets the highlight.
#[derive(Debug, Default)]
pub struct PlaybackSession {
    timeline: Option<WordTimeline>,
    current_word: Option<usize>,
}

impl PlaybackSession {
    /// Create an idle playback session
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeline: None,
            current_word: None,
        }
    }

    /// Begin speaking `text`, canceling any in-progress playback first
    pub fn start(&mut self, text: &str) -> &WordTimeline {
        self.cancel();
        self.current_word = Some(0);
        self.timeline
            .insert(WordTimeline::new(text, estimate_duration(text)))
    }

    /// Advance the highlight to the word at `elapsed`
    ///
    /// Returns the highlighted index, or `None` when playback has finished
    /// (which also resets the session to idle).
    pub fn tick(&mut self, elapsed: Duration) -> Option<usize> {
        let index = self.timeline.as_ref().and_then(|t| t.word_at(elapsed));
        match index {
            Some(i) => {
                self.current_word = Some(i);
                Some(i)
            }
            None => {
                self.finish();
                None
            }
        }
    }

    /// Instantly silence playback and reset highlight state
    pub fn cancel(&mut self) {
        self.timeline = None;
        self.current_word = None;
    }

    /// Whether an utterance is in progress
    #[must_use]
    pub const fn is_speaking(&self) -> bool {
        self.timeline.is_some()
    }

    /// Currently highlighted word index
    #[must_use]
    pub const fn current_word(&self) -> Option<usize> {
        self.current_word
    }

    fn finish(&mut self) {
        self.timeline = None;
        self.current_word = None;
    }
}
