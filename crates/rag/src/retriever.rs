//! Retriever over the shared vector index

use async_trait::async_trait;
use std::sync::Arc;

use docvoice_core::{Result, RetrieveOptions, RetrievedChunk, Retriever};

use crate::embeddings::Embedder;
use crate::index::VectorIndex;

/// Retriever backed by the in-process vector index
pub struct IndexRetriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl IndexRetriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str, options: &RetrieveOptions) -> Result<Vec<RetrievedChunk>> {
        let query_embedding = self.embedder.embed(query).await?;
        let hits = self
            .index
            .search(&query_embedding, options.top_k, options.min_score);

        let chunks = hits
            .into_iter()
            .filter_map(|hit| {
                self.index.chunk(hit.chunk_index).map(|chunk| RetrievedChunk {
                    id: chunk.id.clone(),
                    text: chunk.text.clone(),
                    source: chunk.source.clone(),
                    score: hit.score,
                })
            })
            .collect();

        Ok(chunks)
    }

    fn chunk_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::{ChunkConfig, SentenceChunker};
    use crate::embeddings::HashEmbedder;
    use crate::index::IndexedChunk;

    async fn build_index(texts: &[&str]) -> (Arc<VectorIndex>, Arc<dyn Embedder>) {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(128));
        let chunker = SentenceChunker::new(ChunkConfig::default());

        let mut chunks = Vec::new();
        let mut embeddings = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            for chunk in chunker.chunk(text) {
                embeddings.push(embedder.embed(&chunk.text).await.unwrap());
                chunks.push(IndexedChunk {
                    id: format!("doc{}.txt#{}", i, chunk.position),
                    source: format!("doc{}.txt", i),
                    text: chunk.text,
                    position: chunk.position,
                });
            }
        }

        let index = VectorIndex::new(chunks, embeddings, embedder.fingerprint()).unwrap();
        (Arc::new(index), embedder)
    }

    #[tokio::test]
    async fn test_retrieves_most_relevant_chunk() {
        let (index, embedder) = build_index(&[
            "Gold loan interest rates start at nine percent per annum.",
            "Branch working hours are ten to six on weekdays.",
        ])
        .await;
        let retriever = IndexRetriever::new(index, embedder);

        let results = retriever
            .retrieve(
                "what are the gold loan interest rates",
                &RetrieveOptions { top_k: 1, min_score: 0.0 },
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "doc0.txt");
        assert!(results[0].text.contains("nine percent"));
    }

    #[tokio::test]
    async fn test_top_k_limits_results() {
        let (index, embedder) = build_index(&[
            "Loans need identity proof.",
            "Loans need address proof.",
            "Loans need gold purity checks.",
        ])
        .await;
        let retriever = IndexRetriever::new(index, embedder);
        assert_eq!(retriever.chunk_count(), 3);

        let results = retriever
            .retrieve("loans", &RetrieveOptions { top_k: 2, min_score: 0.0 })
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }
}
