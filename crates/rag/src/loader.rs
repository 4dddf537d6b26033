//! Document Loader
//!
//! Reads a directory of source documents into memory for indexing.
//! Supported formats: PDF (text extraction), plain text, markdown.

use std::path::{Path, PathBuf};

use crate::RagError;

/// A loaded source document with its origin metadata
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path the document was read from
    pub path: PathBuf,
    /// File name for provenance in retrieval results
    pub file_name: String,
    /// Extracted text content
    pub text: String,
}

/// Loader for a directory of source documents
pub struct DocumentLoader;

impl DocumentLoader {
    /// Load all supported documents from a directory
    ///
    /// A missing directory or an unreadable/empty file is not an error:
    /// it is logged and skipped, and the caller decides what an empty
    /// result means. Only directory enumeration failures are returned.
    pub fn load_directory(dir: &Path) -> Result<Vec<SourceDocument>, RagError> {
        if !dir.exists() {
            tracing::warn!(path = %dir.display(), "Documents directory does not exist");
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(dir)
            .map_err(|e| RagError::Index(format!("Failed to read documents directory: {}", e)))?;

        let mut documents = Vec::new();

        for entry in entries {
            let entry =
                entry.map_err(|e| RagError::Index(format!("Failed to read entry: {}", e)))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !matches!(extension, "pdf" | "txt" | "md" | "text") {
                continue;
            }

            match Self::load_file(&path) {
                Ok(doc) if doc.text.trim().is_empty() => {
                    tracing::warn!(file = %path.display(), "Document has no extractable text, skipping");
                },
                Ok(doc) => {
                    tracing::info!(
                        file = %path.display(),
                        bytes = doc.text.len(),
                        "Loaded document"
                    );
                    documents.push(doc);
                },
                Err(e) => {
                    tracing::error!(
                        file = %path.display(),
                        error = %e,
                        "Failed to load document, skipping"
                    );
                },
            }
        }

        tracing::info!(
            directory = %dir.display(),
            documents = documents.len(),
            "Document loading complete"
        );

        Ok(documents)
    }

    /// Load a single document file
    fn load_file(path: &Path) -> Result<SourceDocument, RagError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let text = match extension {
            "pdf" => pdf_extract::extract_text(path)
                .map_err(|e| RagError::Index(format!("PDF extraction failed: {}", e)))?,
            "txt" | "md" | "text" => std::fs::read_to_string(path)
                .map_err(|e| RagError::Index(format!("Failed to read file: {}", e)))?,
            _ => {
                return Err(RagError::Index(format!(
                    "Unsupported file type: {}",
                    extension
                )))
            },
        };

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(SourceDocument {
            path: path.to_path_buf(),
            file_name,
            text,
        })
    }
}
