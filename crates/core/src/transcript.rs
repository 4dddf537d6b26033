//! Transcript types produced by speech-to-text backends

use serde::{Deserialize, Serialize};

/// Result of transcribing an utterance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Transcribed text
    pub text: String,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Whether this is a final transcript (false for streaming partials)
    pub is_final: bool,
    /// Detected language code, if the backend reports one
    pub language: Option<String>,
}

impl TranscriptResult {
    /// Final transcript with the given text and confidence
    pub fn final_text(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
            is_final: true,
            language: None,
        }
    }

    /// True when no usable speech was transcribed
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
