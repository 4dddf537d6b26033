//! Chat model integration
//!
//! Features:
//! - OpenAI-compatible `/chat/completions` backend (Groq, OpenAI, local
//!   gateways)
//! - Retry with exponential backoff for transient failures

pub mod backend;

pub use backend::{ChatCompletionsBackend, LlmConfig};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

impl From<LlmError> for docvoice_core::Error {
    fn from(err: LlmError) -> Self {
        docvoice_core::Error::Llm(err.to_string())
    }
}
