//! Text chunking with configurable size and overlap.

use crate::types::{ChunkCandidate, Document};

/// Chunk a document into overlapping segments.
///
/// Sizes are in characters; boundaries always fall on UTF-8 character
/// boundaries. Each chunk inherits the document metadata.
pub fn chunk_document(document: &Document, chunk_size: usize, overlap: usize) -> Vec<ChunkCandidate> {
    let text = document.text.as_str();
    if text.trim().is_empty() || chunk_size == 0 {
        return vec![];
    }

    // Byte offset of every char, plus the end
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = offsets.len() - 1;

    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0usize;

    while start < char_count {
        let end = (start + chunk_size).min(char_count);
        let chunk_text = text[offsets[start]..offsets[end]].trim();

        if !chunk_text.is_empty() {
            chunks.push(ChunkCandidate {
                position,
                text: chunk_text.to_string(),
                metadata: document.metadata.clone(),
            });
            position += 1;
        }

        if end == char_count {
            break;
        }
        start += step;
    }

    tracing::debug!(
        "Chunked {} into {} chunks (size: {}, overlap: {})",
        document.metadata.source,
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}

/// Chunk every document, preserving document order.
pub fn chunk_documents(documents: &[Document], chunk_size: usize, overlap: usize) -> Vec<ChunkCandidate> {
    documents
        .iter()
        .flat_map(|doc| chunk_document(doc, chunk_size, overlap))
        .collect()
}
