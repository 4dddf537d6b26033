//! Context-injected chat engine
//!
//! Each turn, retrieved document chunks are injected into a per-request
//! system message ahead of the conversation history. Without a
//! retriever, or when retrieval fails mid-turn, the engine answers from
//! conversation history alone.

use std::sync::Arc;

use tokio::sync::Mutex;

use docvoice_core::{
    ChatHistory, ChatMessage, ChatModel, Result, RetrieveOptions, RetrievedChunk, Retriever,
};

use crate::AgentError;

/// Default persona for the voice interface
pub const DEFAULT_INSTRUCTION: &str = "You are a voice assistant. Your interface with users will be voice. \
     You have access to information from specific documents; ground your answers in the \
     provided context when it is relevant. Provide concise responses and avoid using \
     unpronounceable punctuation.";

/// Chat engine configuration
#[derive(Debug, Clone)]
pub struct ChatEngineConfig {
    /// System instruction seeding the conversation
    pub instruction: String,
    /// Retrieval parameters
    pub retrieve: RetrieveOptions,
}

impl Default for ChatEngineConfig {
    fn default() -> Self {
        Self {
            instruction: DEFAULT_INSTRUCTION.to_string(),
            retrieve: RetrieveOptions::default(),
        }
    }
}

/// Chat engine binding the model, the conversation, and retrieval
pub struct ChatEngine {
    model: Arc<dyn ChatModel>,
    retriever: Option<Arc<dyn Retriever>>,
    config: ChatEngineConfig,
    history: Mutex<ChatHistory>,
}

impl ChatEngine {
    pub fn new(
        model: Arc<dyn ChatModel>,
        retriever: Option<Arc<dyn Retriever>>,
        config: ChatEngineConfig,
    ) -> Self {
        if retriever.is_none() {
            tracing::warn!("No retriever configured, responses will not be document-grounded");
        }
        Self {
            model,
            retriever: retriever.clone(),
            history: Mutex::new(ChatHistory::with_system(config.instruction.clone())),
            config,
        }
    }

    /// Whether responses are grounded in an index
    pub fn is_grounded(&self) -> bool {
        self.retriever.is_some()
    }

    /// Produce a response for a user turn and record the exchange
    pub async fn respond(&self, user_text: &str) -> Result<String> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(AgentError::ChatEngine("Empty user turn".to_string()).into());
        }

        let context = self.retrieve_context(user_text).await;

        let response = {
            let history = self.history.lock().await;
            let mut request: Vec<ChatMessage> = Vec::with_capacity(history.len() + 2);
            request.extend_from_slice(history.messages());
            if let Some(context) = context {
                request.push(ChatMessage::system(context));
            }
            request.push(ChatMessage::user(user_text));

            self.model.chat(&request).await?
        };

        let mut history = self.history.lock().await;
        history.push(ChatMessage::user(user_text));
        history.push(ChatMessage::assistant(response.clone()));
        tracing::debug!(turns = history.turn_count(), "Turn recorded");

        Ok(response)
    }

    /// Number of completed user turns
    pub async fn turn_count(&self) -> usize {
        self.history.lock().await.turn_count()
    }

    /// Retrieve context for the query; failures degrade to ungrounded
    async fn retrieve_context(&self, query: &str) -> Option<String> {
        let retriever = self.retriever.as_ref()?;

        match retriever.retrieve(query, &self.config.retrieve).await {
            Ok(chunks) if chunks.is_empty() => None,
            Ok(chunks) => Some(Self::format_context(&chunks)),
            Err(e) => {
                tracing::warn!(error = %e, "Retrieval failed, answering without context");
                None
            },
        }
    }

    fn format_context(chunks: &[RetrievedChunk]) -> String {
        let mut context =
            String::from("Context from documents relevant to the user's question:\n");
        for chunk in chunks {
            context.push_str(&format!("\n[{}]\n{}\n", chunk.source, chunk.text));
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;

    /// Records the last request so tests can inspect injected context
    struct MockModel {
        last_request: SyncMutex<Vec<ChatMessage>>,
    }

    impl MockModel {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                last_request: SyncMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for MockModel {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
            *self.last_request.lock() = messages.to_vec();
            Ok("mock response".to_string())
        }

        fn model_name(&self) -> &str {
            "mock-model"
        }
    }

    struct MockRetriever {
        fail: bool,
    }

    #[async_trait]
    impl Retriever for MockRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            _options: &RetrieveOptions,
        ) -> Result<Vec<RetrievedChunk>> {
            if self.fail {
                return Err(docvoice_core::Error::Retrieval("index offline".to_string()));
            }
            Ok(vec![RetrievedChunk {
                id: "faq.txt#0".to_string(),
                text: "Gold loan rates start at nine percent.".to_string(),
                source: "faq.txt".to_string(),
                score: 0.92,
            }])
        }

        fn chunk_count(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_context_is_injected_per_request_not_history() {
        let model = MockModel::new();
        let engine = ChatEngine::new(
            model.clone(),
            Some(Arc::new(MockRetriever { fail: false })),
            ChatEngineConfig::default(),
        );

        engine.respond("what are the rates?").await.unwrap();

        let request = model.last_request.lock().clone();
        assert!(request
            .iter()
            .any(|m| m.content.contains("nine percent")));

        // The context message must not persist into the next request
        engine.respond("and the tenure?").await.unwrap();
        let request = model.last_request.lock().clone();
        let context_messages = request
            .iter()
            .filter(|m| m.content.contains("nine percent"))
            .count();
        assert_eq!(context_messages, 1);
    }

    #[tokio::test]
    async fn test_ungrounded_without_retriever() {
        let model = MockModel::new();
        let engine = ChatEngine::new(model.clone(), None, ChatEngineConfig::default());
        assert!(!engine.is_grounded());

        let response = engine.respond("hello").await.unwrap();
        assert_eq!(response, "mock response");
    }

    #[tokio::test]
    async fn test_retrieval_failure_degrades_gracefully() {
        let model = MockModel::new();
        let engine = ChatEngine::new(
            model.clone(),
            Some(Arc::new(MockRetriever { fail: true })),
            ChatEngineConfig::default(),
        );

        let response = engine.respond("what are the rates?").await.unwrap();
        assert_eq!(response, "mock response");

        let request = model.last_request.lock().clone();
        assert!(!request.iter().any(|m| m.content.contains("Context")));
    }

    #[tokio::test]
    async fn test_history_accumulates_turns() {
        let engine = ChatEngine::new(MockModel::new(), None, ChatEngineConfig::default());

        engine.respond("first").await.unwrap();
        engine.respond("second").await.unwrap();
        assert_eq!(engine.turn_count().await, 2);
    }

    #[tokio::test]
    async fn test_empty_turn_rejected() {
        let engine = ChatEngine::new(MockModel::new(), None, ChatEngineConfig::default());
        assert!(engine.respond("   ").await.is_err());
        assert_eq!(engine.turn_count().await, 0);
    }
}
