//! Core traits and types for the docvoice assistant
//!
//! This crate provides the foundational types used across all other crates:
//! - Trait seams for pluggable backends (VAD, STT, TTS, chat model, retriever)
//! - Audio frame types
//! - Conversation and transcript types
//! - Error types

pub mod audio;
pub mod conversation;
pub mod error;
pub mod traits;
pub mod transcript;

pub use audio::{AudioFrame, Channels, SampleRate};
pub use conversation::{ChatHistory, ChatMessage, Role};
pub use error::{Error, Result};
pub use transcript::TranscriptResult;

pub use traits::{
    // LLM
    ChatModel,
    // Retrieval
    RetrievedChunk,
    Retriever,
    RetrieveOptions,
    // Speech
    SpeechToText,
    TextToSpeech,
    VADConfig,
    VADEvent,
    VADState,
    VoiceActivityDetector,
};
