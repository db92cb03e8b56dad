//! Energy-based utterance endpointing
//!
//! Splits a microphone stream into utterances: speech starts when block
//! energy rises above a threshold calibrated from ambient noise, and ends
//! after a run of silence.

use super::capture::{SAMPLE_RATE, rms};

/// Lowest threshold calibration may settle on
const MIN_ENERGY_THRESHOLD: f32 = 0.01;

/// Threshold used before calibration
const DEFAULT_ENERGY_THRESHOLD: f32 = 0.03;

/// Ambient energy multiplier applied by calibration
const AMBIENT_RATIO: f32 = 1.5;

/// Minimum duration of speech for an utterance (0.3 seconds at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Silence that ends an utterance (0.5 seconds)
const SILENCE_SAMPLES: usize = 8000;

/// Hard cap on utterance length (30 seconds)
const MAX_UTTERANCE_SAMPLES: usize = SAMPLE_RATE as usize * 30;

/// State of the utterance detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech
    Idle,
    /// Speech detected, accumulating until silence
    Speaking,
    /// Utterance finished and ready to take
    Complete,
}

/// Detects utterance boundaries in a stream of sample blocks
#[derive(Debug)]
pub struct UtteranceDetector {
    threshold: f32,
    state: DetectorState,
    buffer: Vec<f32>,
    silence_counter: usize,
}

impl Default for UtteranceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UtteranceDetector {
    /// Create a detector with the uncalibrated default threshold
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threshold: DEFAULT_ENERGY_THRESHOLD,
            state: DetectorState::Idle,
            buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Set the speech threshold from a sample of ambient noise
    pub fn calibrate(&mut self, ambient: &[f32]) {
        if ambient.is_empty() {
            return;
        }

        let ambient_energy = rms(ambient);
        self.threshold = (ambient_energy * AMBIENT_RATIO).max(MIN_ENERGY_THRESHOLD);
        tracing::debug!(
            ambient_energy,
            threshold = self.threshold,
            "calibrated for ambient noise"
        );
    }

    /// Feed a block of samples
    ///
    /// Returns true once an utterance is complete.
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = rms(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.state = DetectorState::Speaking;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
            }
            DetectorState::Speaking => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > SILENCE_SAMPLES {
                    if self.buffer.len() - self.silence_counter >= MIN_SPEECH_SAMPLES {
                        tracing::debug!(samples = self.buffer.len(), "utterance complete");
                        self.state = DetectorState::Complete;
                    } else {
                        tracing::trace!("speech too short, discarding");
                        self.reset();
                    }
                } else if self.buffer.len() >= MAX_UTTERANCE_SAMPLES {
                    tracing::debug!("utterance reached length cap");
                    self.state = DetectorState::Complete;
                }
            }
            DetectorState::Complete => {}
        }

        self.state == DetectorState::Complete
    }

    /// Take the finished utterance and return to idle
    pub fn take_utterance(&mut self) -> Vec<f32> {
        let utterance = std::mem::take(&mut self.buffer);
        self.reset();
        utterance
    }

    /// Reset detector to idle state, keeping the threshold
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.buffer.clear();
        self.silence_counter = 0;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }

    /// Current speech threshold
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_raises_threshold_above_noise() {
        let mut detector = UtteranceDetector::new();
        detector.calibrate(&[0.1; 1600]);
        assert!((detector.threshold() - 0.15).abs() < 0.001);
    }

    #[test]
    fn test_calibration_floor() {
        let mut detector = UtteranceDetector::new();
        detector.calibrate(&[0.0; 1600]);
        assert!((detector.threshold() - MIN_ENERGY_THRESHOLD).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_calibration_keeps_default() {
        let mut detector = UtteranceDetector::new();
        detector.calibrate(&[]);
        assert!((detector.threshold() - DEFAULT_ENERGY_THRESHOLD).abs() < f32::EPSILON);
    }

    #[test]
    fn test_short_blip_is_discarded() {
        let mut detector = UtteranceDetector::new();
        assert!(!detector.process(&[0.5; 1600]));
        assert_eq!(detector.state(), DetectorState::Speaking);

        assert!(!detector.process(&[0.0; 9600]));
        assert_eq!(detector.state(), DetectorState::Idle);
    }
}
