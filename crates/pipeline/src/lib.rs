//! Audio pipeline
//!
//! Features:
//! - Energy-based Voice Activity Detection with utterance capture
//! - HTTP Speech-to-Text (Deepgram-compatible)
//! - HTTP Text-to-Speech (OpenAI-compatible) with chunked playback
//! - WAV encode/decode between frames and provider payloads

pub mod stt;
pub mod tts;
pub mod vad;
pub mod wav;

pub use stt::{HttpStt, SttConfig};
pub use tts::{HttpTts, TtsConfig};
pub use vad::EnergyVad;

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("VAD error: {0}")]
    Vad(String),

    #[error("STT error: {0}")]
    Stt(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Network(err.to_string())
    }
}

impl From<PipelineError> for docvoice_core::Error {
    fn from(err: PipelineError) -> Self {
        docvoice_core::Error::Pipeline(err.to_string())
    }
}
