//! Utterance recording from the default microphone

use std::time::Duration;

use async_trait::async_trait;

use super::capture::AudioCapture;
use super::detector::UtteranceDetector;
use crate::Result;

/// Audio processing chunk size (100ms at 16kHz)
const CHUNK_SIZE: usize = 1600;

/// How often the capture buffer is drained
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Source of recorded utterances
#[async_trait(?Send)]
pub trait Microphone {
    /// Block until one utterance has been spoken and return its samples
    ///
    /// # Errors
    ///
    /// Returns error if the audio device fails
    async fn record(&mut self) -> Result<Vec<f32>>;
}

/// Records utterances with cpal, calibrating for ambient noise each time
pub struct CpalMicrophone {
    calibration: Duration,
}

impl CpalMicrophone {
    /// Create a microphone that listens to `calibration` worth of ambient
    /// noise before each utterance
    #[must_use]
    pub const fn new(calibration: Duration) -> Self {
        Self { calibration }
    }
}

#[async_trait(?Send)]
impl Microphone for CpalMicrophone {
    async fn record(&mut self) -> Result<Vec<f32>> {
        let mut capture = AudioCapture::new()?;
        let mut detector = UtteranceDetector::new();

        capture.start()?;

        tokio::time::sleep(self.calibration).await;
        detector.calibrate(&capture.take_buffer());

        tracing::info!("listening");

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let samples = capture.take_buffer();
            if samples.is_empty() {
                continue;
            }

            // Blocks larger than a chunk are fed piecewise so energy is
            // measured at a fixed resolution
            for block in samples.chunks(CHUNK_SIZE) {
                if detector.process(block) {
                    capture.stop();
                    return Ok(detector.take_utterance());
                }
            }
        }
    }
}
