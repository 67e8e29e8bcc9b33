//! Playback plan integration tests

use std::time::Duration;

use devvoice::speech::{
    PREFERRED_VOICES, PlaybackSession, VoiceInfo, WordTimeline, estimate_duration, select_voice,
};

fn voice(name: &str, lang: &str, default_voice: bool) -> VoiceInfo {
    VoiceInfo {
        name: name.to_string(),
        lang: lang.to_string(),
        default_voice,
    }
}

#[test]
fn test_voice_matching_is_case_insensitive_substring() {
    let voices = vec![
        voice("Microsoft David - English (United States)", "en-US", true),
        voice("google us english", "en-US", false),
    ];

    let picked = select_voice(&voices, &PREFERRED_VOICES).unwrap();
    assert_eq!(picked.name, "google us english");
}

#[test]
fn test_voice_preference_order_is_respected() {
    let voices = vec![
        voice("Daniel (English UK)", "en-GB", false),
        voice("Samantha", "en-US", false),
    ];

    // Samantha precedes Daniel in the preferred list
    let picked = select_voice(&voices, &PREFERRED_VOICES).unwrap();
    assert_eq!(picked.name, "Samantha");
}

#[test]
fn test_timeline_spreads_estimate_across_words() {
    let text = "Use slicing to reverse the string";
    let total = estimate_duration(text);
    let timeline = WordTimeline::new(text, total);

    assert_eq!(timeline.len(), 6);
    // 6 words at 150 wpm is 2.4 seconds, 400 ms per word
    assert_eq!(total, Duration::from_millis(2400));
    assert_eq!(timeline.slot(), Duration::from_millis(400));
    assert_eq!(timeline.word_at(Duration::from_millis(500)), Some(1));
}

#[test]
fn test_cancel_mid_speech_clears_state_immediately() {
    let mut playback = PlaybackSession::new();
    playback.start("canceling playback must reset the highlight instantly");

    assert!(playback.is_speaking());
    playback.tick(Duration::from_millis(900));
    assert!(playback.current_word().is_some());

    playback.cancel();
    assert!(!playback.is_speaking());
    assert_eq!(playback.current_word(), None);

    // Canceling twice is harmless
    playback.cancel();
    assert!(!playback.is_speaking());
}

#[test]
fn test_playback_finishes_past_the_last_word() {
    let mut playback = PlaybackSession::new();
    playback.start("two words");

    assert_eq!(playback.tick(Duration::from_millis(100)), Some(0));
    assert_eq!(playback.tick(Duration::from_millis(500)), Some(1));

    // Past the end: playback completes and resets to idle
    assert_eq!(playback.tick(Duration::from_secs(5)), None);
    assert!(!playback.is_speaking());
}

#[test]
fn test_starting_playback_cancels_the_previous_utterance() {
    let mut playback = PlaybackSession::new();
    playback.start("first answer being spoken aloud");
    playback.tick(Duration::from_millis(800));

    let timeline = playback.start("second answer");
    assert_eq!(timeline.len(), 2);
    assert_eq!(playback.current_word(), Some(0));
}
