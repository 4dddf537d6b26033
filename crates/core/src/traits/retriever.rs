//! Retrieval trait for grounding chat responses

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Options for a retrieval call
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    /// Maximum number of chunks to return
    pub top_k: usize,
    /// Minimum similarity score; lower-scoring chunks are dropped
    pub min_score: f32,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_score: 0.0,
        }
    }
}

/// A retrieved chunk with its provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk id in the index
    pub id: String,
    /// Chunk text
    pub text: String,
    /// Source document path
    pub source: String,
    /// Similarity score
    pub score: f32,
}

/// Document retrieval interface
///
/// The chat engine calls this on every user turn; implementations search
/// a read-only shared index and must be safe to call concurrently.
#[async_trait]
pub trait Retriever: Send + Sync + 'static {
    /// Retrieve the chunks most similar to the query
    async fn retrieve(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> Result<Vec<RetrievedChunk>>;

    /// Number of chunks in the underlying index
    fn chunk_count(&self) -> usize;
}
