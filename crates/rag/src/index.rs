//! Vector index and its on-disk snapshot
//!
//! The index is built once, shared read-only across sessions, and
//! persisted as two JSON files:
//! - `docstore.json`: chunk texts and provenance
//! - `index_store.json`: embedding vectors, format version, embedder
//!   fingerprint
//!
//! A snapshot is valid only when both files are present, parse, carry
//! the supported format version and expected embedder fingerprint, and
//! agree on the chunk-id set. Anything less is reported as corrupt or
//! absent; the caller decides to rebuild.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::embeddings::cosine_similarity;
use crate::RagError;

/// Document store file name inside the persistence directory
pub const DOCSTORE_FILE: &str = "docstore.json";
/// Index store file name inside the persistence directory
pub const INDEX_STORE_FILE: &str = "index_store.json";

/// Snapshot format version
const SNAPSHOT_VERSION: u32 = 1;

/// A chunk stored in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    /// Unique chunk id
    pub id: String,
    /// Source document file name
    pub source: String,
    /// Chunk text
    pub text: String,
    /// Position of the chunk within its document
    pub position: usize,
}

/// On-disk document store
#[derive(Debug, Serialize, Deserialize)]
struct DocStoreFile {
    version: u32,
    chunks: Vec<IndexedChunk>,
}

/// One embedding row in the index store
#[derive(Debug, Serialize, Deserialize)]
struct ChunkEmbedding {
    id: String,
    vector: Vec<f32>,
}

/// On-disk index store
#[derive(Debug, Serialize, Deserialize)]
struct IndexStoreFile {
    version: u32,
    embedder: String,
    embeddings: Vec<ChunkEmbedding>,
}

/// Result of probing a persistence directory for a snapshot
#[derive(Debug)]
pub enum SnapshotState {
    /// Both files present, consistent, deserialized
    Loaded(VectorIndex),
    /// Files present but unusable; carries the diagnostic reason
    Corrupt(String),
    /// One or both required files missing
    Absent,
}

/// A search hit from the index
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Index of the chunk within the index
    pub chunk_index: usize,
    /// Similarity score
    pub score: f32,
}

/// In-process vector index
///
/// Read-only after construction; shared across sessions behind `Arc`.
#[derive(Debug)]
pub struct VectorIndex {
    chunks: Vec<IndexedChunk>,
    embeddings: Vec<Vec<f32>>,
    embedder_fingerprint: String,
}

impl VectorIndex {
    /// Build an index from chunks and their embeddings
    pub fn new(
        chunks: Vec<IndexedChunk>,
        embeddings: Vec<Vec<f32>>,
        embedder_fingerprint: impl Into<String>,
    ) -> Result<Self, RagError> {
        if chunks.len() != embeddings.len() {
            return Err(RagError::Index(format!(
                "Chunk and embedding count mismatch: {} vs {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        Ok(Self {
            chunks,
            embeddings,
            embedder_fingerprint: embedder_fingerprint.into(),
        })
    }

    /// Number of chunks in the index
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Fingerprint of the embedder the index was built with
    pub fn embedder_fingerprint(&self) -> &str {
        &self.embedder_fingerprint
    }

    /// Get a chunk by its position in the index
    pub fn chunk(&self, index: usize) -> Option<&IndexedChunk> {
        self.chunks.get(index)
    }

    /// Cosine similarity search
    pub fn search(&self, query_embedding: &[f32], top_k: usize, min_score: f32) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(chunk_index, embedding)| SearchHit {
                chunk_index,
                score: cosine_similarity(query_embedding, embedding),
            })
            .filter(|hit| hit.score >= min_score)
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        hits
    }

    /// Persist the snapshot, overwriting any prior files
    pub fn persist(&self, persist_dir: &Path) -> Result<(), RagError> {
        let docstore = DocStoreFile {
            version: SNAPSHOT_VERSION,
            chunks: self.chunks.clone(),
        };
        let index_store = IndexStoreFile {
            version: SNAPSHOT_VERSION,
            embedder: self.embedder_fingerprint.clone(),
            embeddings: self
                .chunks
                .iter()
                .zip(self.embeddings.iter())
                .map(|(chunk, vector)| ChunkEmbedding {
                    id: chunk.id.clone(),
                    vector: vector.clone(),
                })
                .collect(),
        };

        let docstore_json = serde_json::to_string(&docstore)
            .map_err(|e| RagError::Persist(format!("Failed to serialize docstore: {}", e)))?;
        let index_json = serde_json::to_string(&index_store)
            .map_err(|e| RagError::Persist(format!("Failed to serialize index store: {}", e)))?;

        std::fs::write(persist_dir.join(DOCSTORE_FILE), docstore_json)
            .map_err(|e| RagError::Persist(format!("Failed to write docstore: {}", e)))?;
        std::fs::write(persist_dir.join(INDEX_STORE_FILE), index_json)
            .map_err(|e| RagError::Persist(format!("Failed to write index store: {}", e)))?;

        tracing::info!(
            path = %persist_dir.display(),
            chunks = self.chunks.len(),
            "Persisted index snapshot"
        );

        Ok(())
    }

    /// Probe a persistence directory for a snapshot
    ///
    /// Never returns an error: unusable snapshots are reported as
    /// `Corrupt` with the reason, missing files as `Absent`.
    pub fn load_snapshot(persist_dir: &Path, expected_fingerprint: &str) -> SnapshotState {
        let docstore_path = persist_dir.join(DOCSTORE_FILE);
        let index_path = persist_dir.join(INDEX_STORE_FILE);

        if !docstore_path.exists() || !index_path.exists() {
            return SnapshotState::Absent;
        }

        let docstore_raw = match std::fs::read_to_string(&docstore_path) {
            Ok(raw) => raw,
            Err(e) => return SnapshotState::Corrupt(format!("Failed to read docstore: {}", e)),
        };
        let index_raw = match std::fs::read_to_string(&index_path) {
            Ok(raw) => raw,
            Err(e) => return SnapshotState::Corrupt(format!("Failed to read index store: {}", e)),
        };

        let docstore: DocStoreFile = match serde_json::from_str(&docstore_raw) {
            Ok(parsed) => parsed,
            Err(e) => return SnapshotState::Corrupt(format!("Malformed docstore: {}", e)),
        };
        let index_store: IndexStoreFile = match serde_json::from_str(&index_raw) {
            Ok(parsed) => parsed,
            Err(e) => return SnapshotState::Corrupt(format!("Malformed index store: {}", e)),
        };

        if docstore.version != SNAPSHOT_VERSION || index_store.version != SNAPSHOT_VERSION {
            return SnapshotState::Corrupt(format!(
                "Unsupported snapshot version: docstore v{}, index store v{} (supported v{})",
                docstore.version, index_store.version, SNAPSHOT_VERSION
            ));
        }

        if index_store.embedder != expected_fingerprint {
            return SnapshotState::Corrupt(format!(
                "Embedder fingerprint mismatch: snapshot '{}', configured '{}'",
                index_store.embedder, expected_fingerprint
            ));
        }

        // Mutual consistency: identical chunk-id sets
        let doc_ids: HashSet<&str> = docstore.chunks.iter().map(|c| c.id.as_str()).collect();
        let index_ids: HashSet<&str> =
            index_store.embeddings.iter().map(|e| e.id.as_str()).collect();
        if doc_ids != index_ids || docstore.chunks.len() != index_store.embeddings.len() {
            return SnapshotState::Corrupt(format!(
                "Docstore and index store disagree: {} chunks vs {} embeddings",
                docstore.chunks.len(),
                index_store.embeddings.len()
            ));
        }

        let mut vectors: HashMap<String, Vec<f32>> = index_store
            .embeddings
            .into_iter()
            .map(|e| (e.id, e.vector))
            .collect();

        let embeddings: Vec<Vec<f32>> = docstore
            .chunks
            .iter()
            .map(|chunk| vectors.remove(&chunk.id).unwrap_or_default())
            .collect();

        SnapshotState::Loaded(VectorIndex {
            chunks: docstore.chunks,
            embeddings,
            embedder_fingerprint: index_store.embedder,
        })
    }
}
