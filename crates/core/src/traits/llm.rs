//! Chat model trait

use crate::{ChatMessage, Result};
use async_trait::async_trait;

/// Conversational language model interface
///
/// Implementations call an external inference service; no model runs in
/// this process.
#[async_trait]
pub trait ChatModel: Send + Sync + 'static {
    /// Produce the assistant response for the given conversation
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
