//! Index Manager
//!
//! Decides between serving a persisted snapshot and rebuilding the
//! index from source documents. Snapshot problems are never fatal: a
//! corrupt or stale snapshot is logged and overwritten by a rebuild.
//! Only an unusable persistence directory aborts startup.

use std::path::PathBuf;
use std::sync::Arc;

use crate::chunker::{ChunkConfig, SentenceChunker};
use crate::embeddings::Embedder;
use crate::index::{IndexedChunk, SnapshotState, VectorIndex};
use crate::loader::DocumentLoader;
use crate::RagError;

/// Index Manager configuration
#[derive(Debug, Clone)]
pub struct IndexManagerConfig {
    /// Directory holding source documents
    pub documents_dir: PathBuf,
    /// Directory for the persisted snapshot
    pub persist_dir: PathBuf,
    /// Chunking parameters used on rebuild
    pub chunking: ChunkConfig,
}

/// Builds or loads the vector index at startup
pub struct IndexManager {
    config: IndexManagerConfig,
    embedder: Arc<dyn Embedder>,
}

impl IndexManager {
    pub fn new(config: IndexManagerConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self { config, embedder }
    }

    /// Load the persisted snapshot if it is usable, otherwise rebuild
    /// from source documents.
    ///
    /// Returns `Ok(None)` when there is neither a usable snapshot nor
    /// any source documents; the caller serves sessions ungrounded.
    pub async fn load_or_build(&self) -> Result<Option<Arc<VectorIndex>>, RagError> {
        std::fs::create_dir_all(&self.config.persist_dir).map_err(|e| {
            RagError::Persist(format!(
                "Cannot create persistence directory {}: {}",
                self.config.persist_dir.display(),
                e
            ))
        })?;

        let fingerprint = self.embedder.fingerprint();
        match VectorIndex::load_snapshot(&self.config.persist_dir, &fingerprint) {
            SnapshotState::Loaded(index) => {
                tracing::info!(
                    path = %self.config.persist_dir.display(),
                    chunks = index.len(),
                    "Loaded persisted index snapshot"
                );
                return Ok(Some(Arc::new(index)));
            },
            SnapshotState::Corrupt(reason) => {
                tracing::warn!(
                    path = %self.config.persist_dir.display(),
                    reason = %reason,
                    "Snapshot unusable, rebuilding index"
                );
            },
            SnapshotState::Absent => {
                tracing::info!(
                    path = %self.config.persist_dir.display(),
                    "No persisted snapshot, building index from documents"
                );
            },
        }

        self.rebuild().await
    }

    /// Rebuild the index from source documents and persist the result
    async fn rebuild(&self) -> Result<Option<Arc<VectorIndex>>, RagError> {
        let documents_dir = self.config.documents_dir.clone();
        let chunking = self.config.chunking.clone();

        // Document loading and chunking are blocking filesystem / CPU
        // work; keep them off the async runtime.
        let chunks = tokio::task::spawn_blocking(move || -> Result<Vec<IndexedChunk>, RagError> {
            let documents = DocumentLoader::load_directory(&documents_dir)?;
            let chunker = SentenceChunker::new(chunking);

            let mut chunks = Vec::new();
            for doc in &documents {
                for chunk in chunker.chunk(&doc.text) {
                    chunks.push(IndexedChunk {
                        id: format!("{}#{}", doc.file_name, chunk.position),
                        source: doc.file_name.clone(),
                        text: chunk.text,
                        position: chunk.position,
                    });
                }
            }
            Ok(chunks)
        })
        .await
        .map_err(|e| RagError::Index(format!("Index build task failed: {}", e)))??;

        if chunks.is_empty() {
            tracing::warn!(
                documents_dir = %self.config.documents_dir.display(),
                "No indexable documents found, running without an index"
            );
            return Ok(None);
        }

        let mut embeddings = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            embeddings.push(self.embedder.embed(&chunk.text).await?);
        }

        let index = VectorIndex::new(chunks, embeddings, self.embedder.fingerprint())?;
        index.persist(&self.config.persist_dir)?;

        tracing::info!(
            chunks = index.len(),
            embedder = %self.embedder.fingerprint(),
            "Index rebuild complete"
        );

        Ok(Some(Arc::new(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashEmbedder;
    use tempfile::tempdir;

    fn manager_for(documents_dir: PathBuf, persist_dir: PathBuf) -> IndexManager {
        IndexManager::new(
            IndexManagerConfig {
                documents_dir,
                persist_dir,
                chunking: ChunkConfig::default(),
            },
            Arc::new(HashEmbedder::new(64)),
        )
    }

    #[tokio::test]
    async fn test_no_documents_no_snapshot_yields_none() {
        let persist = tempdir().unwrap();
        let manager = manager_for(PathBuf::from("/nonexistent/docs"), persist.path().into());

        let index = manager.load_or_build().await.unwrap();
        assert!(index.is_none());
    }

    #[tokio::test]
    async fn test_unwritable_persist_dir_is_fatal() {
        let manager = manager_for(
            PathBuf::from("/nonexistent/docs"),
            PathBuf::from("/proc/docvoice-test-storage"),
        );

        assert!(manager.load_or_build().await.is_err());
    }

    #[tokio::test]
    async fn test_build_then_reload_from_snapshot() {
        let docs = tempdir().unwrap();
        let persist = tempdir().unwrap();
        std::fs::write(
            docs.path().join("faq.txt"),
            "Gold loans are secured against pledged gold. Interest rates start at nine percent.",
        )
        .unwrap();

        let manager = manager_for(docs.path().into(), persist.path().into());
        let built = manager.load_or_build().await.unwrap().expect("index built");
        assert!(built.len() > 0);

        // Second run must serve the snapshot even with the documents gone
        drop(docs);
        let manager2 = manager_for(PathBuf::from("/nonexistent/docs"), persist.path().into());
        let loaded = manager2.load_or_build().await.unwrap().expect("index loaded");
        assert_eq!(loaded.len(), built.len());
    }
}
