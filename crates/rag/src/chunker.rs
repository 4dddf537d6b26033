//! Sentence-based text chunking
//!
//! Splits document text on sentence boundaries and packs sentences into
//! chunks of a target size, with single-sentence overlap between
//! consecutive chunks so retrieval does not lose context at boundaries.

use unicode_segmentation::UnicodeSegmentation;

/// Configuration for chunking
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Target chunk size in characters
    pub target_chunk_chars: usize,
    /// Hard maximum chunk size in characters
    pub max_chunk_chars: usize,
    /// Carry the last sentence of a chunk into the next one
    pub sentence_overlap: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            target_chunk_chars: 800,
            max_chunk_chars: 1600,
            sentence_overlap: true,
        }
    }
}

/// A chunk of document text
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// Chunk text
    pub text: String,
    /// Position of this chunk within its document (0-based)
    pub position: usize,
}

/// Sentence-boundary chunker
pub struct SentenceChunker {
    config: ChunkConfig,
}

impl SentenceChunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Split text into chunks
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let sentences: Vec<&str> = text
            .split_sentence_bounds()
            .filter(|s| !s.trim().is_empty())
            .collect();

        if sentences.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut last_sentence = "";

        for sentence in sentences {
            let would_be = current.len() + sentence.len();

            if !current.is_empty() && would_be > self.config.target_chunk_chars {
                chunks.push(current.trim().to_string());
                current = if self.config.sentence_overlap {
                    last_sentence.to_string()
                } else {
                    String::new()
                };
            }

            // Sentence longer than the hard cap gets split on whitespace
            if sentence.len() > self.config.max_chunk_chars {
                for piece in Self::split_oversized(sentence, self.config.max_chunk_chars) {
                    if !current.trim().is_empty() {
                        chunks.push(current.trim().to_string());
                        current = String::new();
                    }
                    chunks.push(piece);
                }
                last_sentence = "";
                continue;
            }

            current.push_str(sentence);
            last_sentence = sentence;
        }

        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }

        chunks
            .into_iter()
            .enumerate()
            .map(|(position, text)| TextChunk { text, position })
            .collect()
    }

    fn split_oversized(sentence: &str, max_chars: usize) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();

        for word in sentence.split_whitespace() {
            if !current.is_empty() && current.len() + word.len() + 1 > max_chars {
                pieces.push(current.clone());
                current.clear();
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }

        if !current.is_empty() {
            pieces.push(current);
        }

        pieces
    }
}
