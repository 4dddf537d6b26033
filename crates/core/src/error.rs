//! Error types for the docvoice assistant

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the docvoice assistant
#[derive(Error, Debug)]
pub enum Error {
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True when the condition is recoverable within the current session
    /// (a turn can be abandoned without tearing the session down).
    pub fn is_turn_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Pipeline(_) | Error::Llm(_) | Error::Retrieval(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Index("snapshot missing".to_string());
        assert_eq!(err.to_string(), "Index error: snapshot missing");
    }

    #[test]
    fn test_turn_recoverable() {
        assert!(Error::Llm("provider 503".into()).is_turn_recoverable());
        assert!(!Error::Config("bad port".into()).is_turn_recoverable());
    }
}
