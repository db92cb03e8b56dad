//! Wake phrase gating for transcripts

/// Matches a wake phrase in transcribed text
#[derive(Debug, Clone)]
pub struct WakeWord {
    phrase: String,
}

impl WakeWord {
    /// Create a matcher for `phrase` (compared lowercase)
    #[must_use]
    pub fn new(phrase: &str) -> Self {
        Self {
            phrase: phrase.trim().to_lowercase(),
        }
    }

    /// The normalized phrase
    #[must_use]
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Check a lowercased transcript for the phrase
    ///
    /// Returns `None` when the phrase is absent. Otherwise every occurrence
    /// is removed and the cleaned remainder returned, which may be empty.
    #[must_use]
    pub fn strip(&self, transcript: &str) -> Option<String> {
        if self.phrase.is_empty() || !transcript.contains(&self.phrase) {
            return None;
        }

        let remainder = transcript.replace(&self.phrase, "");
        Some(trim_edges(&remainder).to_string())
    }
}

/// Trim whitespace and ASCII punctuation from both ends
///
/// STT services punctuate, so `hey misty, move 3 seconds.` must reduce to
/// `move 3 seconds`.
#[must_use]
pub fn trim_edges(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
}
