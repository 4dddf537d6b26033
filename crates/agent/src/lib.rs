//! Conversational session driver
//!
//! Features:
//! - Context-injected chat engine with graceful ungrounded fallback
//! - Room abstraction (participant lifecycle, audio in, playback out)
//! - Voice session loop: VAD, STT, chat, TTS, with barge-in

pub mod chat_engine;
pub mod room;
pub mod session;

pub use chat_engine::{ChatEngine, ChatEngineConfig};
pub use room::{Room, RoomEvent, RoomHandle};
pub use session::{VoiceSession, VoiceSessionConfig, VoiceSessionEvent, VoiceSessionState};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Chat engine error: {0}")]
    ChatEngine(String),

    #[error("Room error: {0}")]
    Room(String),

    #[error("Session error: {0}")]
    Session(String),
}

impl From<AgentError> for docvoice_core::Error {
    fn from(err: AgentError) -> Self {
        docvoice_core::Error::Session(err.to_string())
    }
}
