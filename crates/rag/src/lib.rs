//! Retrieval-augmented generation support
//!
//! Features:
//! - Document loading from a directory of PDF / text / markdown files
//! - Sentence-based chunking
//! - Pluggable embedders (HTTP provider or deterministic offline hash)
//! - In-process vector index with cosine similarity search
//! - Two-file JSON snapshot persistence (`docstore.json` + `index_store.json`)
//! - Load-or-rebuild index management with explicit snapshot probing
//! - Core `Retriever` implementation over the shared index

pub mod chunker;
pub mod embeddings;
pub mod index;
pub mod loader;
pub mod manager;
pub mod retriever;

pub use chunker::{ChunkConfig, SentenceChunker, TextChunk};
pub use embeddings::{Embedder, EmbeddingConfig, HashEmbedder, HttpEmbedder};
pub use index::{IndexedChunk, SnapshotState, VectorIndex, DOCSTORE_FILE, INDEX_STORE_FILE};
pub use loader::{DocumentLoader, SourceDocument};
pub use manager::{IndexManager, IndexManagerConfig};
pub use retriever::IndexRetriever;

use thiserror::Error;

/// RAG errors
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Persistence error: {0}")]
    Persist(String),

    #[error("Search error: {0}")]
    Search(String),
}

impl From<RagError> for docvoice_core::Error {
    fn from(err: RagError) -> Self {
        docvoice_core::Error::Index(err.to_string())
    }
}
