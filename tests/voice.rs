//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;

use misty_voice::voice::{
    DetectorState, SAMPLE_RATE, SpeechCapture, UtteranceDetector, samples_to_wav,
};
use tokio_test::assert_ok;

mod common;
use common::{ScriptedMicrophone, ScriptedTranscriber, scripted_listener};

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

/// Feed audio to the detector in 100ms blocks, stopping when it completes
fn feed(detector: &mut UtteranceDetector, samples: &[f32]) -> bool {
    samples.chunks(1600).any(|block| detector.process(block))
}

#[test]
fn test_detector_ignores_silence() {
    let mut detector = UtteranceDetector::new();

    assert!(!feed(&mut detector, &generate_silence(2.0)));
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_detector_completes_after_trailing_silence() {
    let mut detector = UtteranceDetector::new();

    assert!(!feed(&mut detector, &generate_sine_samples(440.0, 1.0, 0.5)));
    assert_eq!(detector.state(), DetectorState::Speaking);

    assert!(feed(&mut detector, &generate_silence(1.0)));
    assert_eq!(detector.state(), DetectorState::Complete);

    let utterance = detector.take_utterance();
    assert!(utterance.len() >= SAMPLE_RATE as usize);
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_detector_caps_long_utterances() {
    let mut detector = UtteranceDetector::new();

    assert!(feed(&mut detector, &generate_sine_samples(440.0, 31.0, 0.5)));
    assert_eq!(detector.take_utterance().len(), SAMPLE_RATE as usize * 30);
}

#[test]
fn test_calibrated_detector_ignores_ambient_noise() {
    let mut detector = UtteranceDetector::new();
    let ambient = generate_sine_samples(60.0, 1.0, 0.1);
    detector.calibrate(&ambient);

    assert!(!feed(&mut detector, &ambient));
    assert_eq!(detector.state(), DetectorState::Idle);

    assert!(!feed(&mut detector, &generate_sine_samples(440.0, 0.5, 0.5)));
    assert_eq!(detector.state(), DetectorState::Speaking);
}

#[test]
fn test_wav_encoding_roundtrip_length() {
    let samples = generate_sine_samples(440.0, 0.5, 0.8);
    let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
    assert_eq!(reader.spec().bits_per_sample, 16);
    assert_eq!(reader.len() as usize, samples.len());
}

#[tokio::test]
async fn test_wake_phrase_required_before_returning() {
    let mut listener = scripted_listener(
        &["good morning", "turn left please", "Hey Misty, how tall is Everest?"],
        Some("hey misty"),
    );

    let heard = assert_ok!(listener.listen().await);
    assert_eq!(heard.as_deref(), Some("how tall is everest"));
}

#[tokio::test]
async fn test_wake_phrase_alone_yields_nothing() {
    let mut listener = scripted_listener(&["Hey Misty."], Some("hey misty"));

    let heard = assert_ok!(listener.listen().await);
    assert_eq!(heard, None);
}

#[tokio::test]
async fn test_wake_mode_relistens_after_unintelligible_audio() {
    let mut listener = scripted_listener(&["", "  ", "hey misty move 2 seconds"], Some("hey misty"));

    let heard = assert_ok!(listener.listen().await);
    assert_eq!(heard.as_deref(), Some("move 2 seconds"));
}

#[tokio::test]
async fn test_plain_mode_keeps_case() {
    let mut listener = scripted_listener(&["  What is the Capital of France?  "], None);

    let heard = assert_ok!(listener.listen().await);
    assert_eq!(heard.as_deref(), Some("What is the Capital of France"));
}

#[tokio::test]
async fn test_plain_mode_trims_punctuated_move() {
    let mut listener = scripted_listener(&["move 3 seconds."], None);

    let heard = assert_ok!(listener.listen().await);
    assert_eq!(heard.as_deref(), Some("move 3 seconds"));
}

#[tokio::test]
async fn test_plain_mode_punctuation_only_yields_nothing() {
    let mut listener = scripted_listener(&["..."], None);

    let heard = assert_ok!(listener.listen().await);
    assert_eq!(heard, None);
}

#[tokio::test]
async fn test_plain_mode_unintelligible_yields_nothing() {
    let mut listener = scripted_listener(&[""], None);

    let heard = assert_ok!(listener.listen().await);
    assert_eq!(heard, None);
}

#[tokio::test]
async fn test_stt_failure_yields_nothing() {
    let mut listener = SpeechCapture::new(
        Box::new(ScriptedMicrophone::new(1)),
        Box::new(ScriptedTranscriber::new(vec![Err("connection refused")])),
    );

    let heard = assert_ok!(listener.listen().await);
    assert_eq!(heard, None);
}

#[tokio::test]
async fn test_microphone_failure_propagates() {
    let mut listener = scripted_listener(&[], None);

    assert!(listener.listen().await.is_err());
}
