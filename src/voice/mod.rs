//! Voice input
//!
//! Handles microphone capture, utterance endpointing, transcription and the
//! wake phrase gate. Speech output is the robot's job (see `robot`).

mod capture;
mod detector;
mod listener;
mod microphone;
mod stt;
mod wake_word;

pub use capture::{AudioCapture, SAMPLE_RATE, rms, samples_to_wav};
pub use detector::{DetectorState, UtteranceDetector};
pub use listener::SpeechCapture;
pub use microphone::{CpalMicrophone, Microphone};
pub use stt::{SpeechToText, Transcriber};
pub use wake_word::{WakeWord, trim_edges};
