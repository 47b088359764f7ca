//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};

/// Metadata attached to every loaded document and inherited by its chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// URL or file path the text came from
    pub source: String,

    /// Source kind: "url" or "file"
    #[serde(rename = "type")]
    pub source_type: String,

    /// Extracted text length in characters
    pub length: usize,
}

/// Text extracted from one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Extracted text
    pub text: String,

    /// Origin metadata
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a document, recording its length.
    pub fn new(text: String, source: impl Into<String>, source_type: impl Into<String>) -> Self {
        let length = text.chars().count();
        Self {
            text,
            metadata: DocumentMetadata {
                source: source.into(),
                source_type: source_type.into(),
                length,
            },
        }
    }
}

/// A chunk candidate before embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkCandidate {
    /// Position within its document
    pub position: u32,

    /// Chunk text
    pub text: String,

    /// Metadata inherited from the document
    pub metadata: DocumentMetadata,
}

/// A chunk stored in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    /// Unique chunk identifier
    pub id: String,

    /// Position within its document
    pub position: u32,

    /// Chunk text
    pub text: String,

    /// Metadata inherited from the document
    pub metadata: DocumentMetadata,

    /// Embedding vector
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// A chunk returned by similarity search, best match first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk text
    pub text: String,

    /// Origin metadata
    pub metadata: DocumentMetadata,

    /// Position within its document
    pub position: u32,

    /// Cosine similarity to the query
    pub score: f32,
}

/// Statistics about an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of distinct sources
    pub sources_count: u32,

    /// Number of chunks
    pub chunks_count: u32,

    /// Embedding dimensions
    pub dimensions: usize,
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Source descriptors listed in the sources file
    pub sources_listed: u32,

    /// Documents that produced text
    pub documents_loaded: u32,

    /// Chunks written to the index
    pub chunks_indexed: u32,

    /// Wall time in seconds
    pub duration_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_records_char_length() {
        let doc = Document::new("Umuganda é".to_string(), "notes.txt", "file");
        assert_eq!(doc.metadata.length, 10);
        assert_eq!(doc.metadata.source_type, "file");
    }

    #[test]
    fn test_metadata_serializes_type_key() {
        let doc = Document::new("x".to_string(), "https://example.edu", "url");
        let json = serde_json::to_value(&doc.metadata).unwrap();
        assert_eq!(json["type"], "url");
        assert_eq!(json["length"], 1);
    }
}
