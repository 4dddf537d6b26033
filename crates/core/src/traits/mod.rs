//! Core trait seams
//!
//! Every pipeline stage sits behind one of these traits so each stage can
//! be replaced independently:
//! - `VoiceActivityDetector`: segments audio into utterances
//! - `SpeechToText`: utterance audio to text
//! - `ChatModel`: conversation to response text
//! - `TextToSpeech`: response text to audio
//! - `Retriever`: document retrieval for grounding

mod llm;
mod retriever;
mod speech;

pub use llm::ChatModel;
pub use retriever::{RetrieveOptions, RetrievedChunk, Retriever};
pub use speech::{
    SpeechToText, TextToSpeech, VADConfig, VADEvent, VADState, VoiceActivityDetector,
};
