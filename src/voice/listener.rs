//! Microphone-to-transcript capture with optional wake phrase gating

use super::capture::{SAMPLE_RATE, samples_to_wav};
use super::microphone::Microphone;
use super::stt::Transcriber;
use super::wake_word::{WakeWord, trim_edges};
use crate::Result;

/// Records utterances and turns them into transcripts
pub struct SpeechCapture {
    microphone: Box<dyn Microphone>,
    transcriber: Box<dyn Transcriber>,
    wake_word: Option<WakeWord>,
}

impl SpeechCapture {
    /// Capture without a wake phrase; transcripts keep their original case
    /// and lose only surrounding whitespace and punctuation
    #[must_use]
    pub fn new(microphone: Box<dyn Microphone>, transcriber: Box<dyn Transcriber>) -> Self {
        Self {
            microphone,
            transcriber,
            wake_word: None,
        }
    }

    /// Require `wake_word` in every transcript; transcripts are lowercased
    #[must_use]
    pub fn with_wake_word(mut self, wake_word: WakeWord) -> Self {
        self.wake_word = Some(wake_word);
        self
    }

    /// Listen for the next transcript
    ///
    /// Returns `Ok(None)` when nothing usable was recognized or the STT
    /// service failed. With a wake phrase, utterances without it (and
    /// unintelligible ones) are dropped and listening restarts immediately.
    ///
    /// # Errors
    ///
    /// Returns error only if the microphone or WAV encoding fails
    pub async fn listen(&mut self) -> Result<Option<String>> {
        loop {
            match &self.wake_word {
                Some(wake) => tracing::info!("listening, say \"{}\" to activate", wake.phrase()),
                None => tracing::info!("listening, speak now"),
            }

            let samples = self.microphone.record().await?;
            let wav = samples_to_wav(&samples, SAMPLE_RATE)?;

            let transcript = match self.transcriber.transcribe(&wav).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "could not request results, check the connection");
                    return Ok(None);
                }
            };

            let transcript = transcript.trim();
            if transcript.is_empty() {
                if self.wake_word.is_some() {
                    tracing::info!("could not understand, listening again");
                    continue;
                }
                tracing::info!("sorry, I didn't understand");
                return Ok(None);
            }

            let Some(wake) = &self.wake_word else {
                let text = trim_edges(transcript);
                tracing::info!(transcript = text, "you said");
                return Ok((!text.is_empty()).then(|| text.to_string()));
            };

            let lowered = transcript.to_lowercase();
            tracing::info!(transcript = %lowered, "you said");

            match wake.strip(&lowered) {
                Some(command) if command.is_empty() => return Ok(None),
                Some(command) => return Ok(Some(command)),
                None => tracing::info!("no wake word detected, continuing to listen"),
            }
        }
    }
}
