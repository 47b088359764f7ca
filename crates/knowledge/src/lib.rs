//! Knowledge base and question answering for the FAQ assistant.
//!
//! Documents listed in a sources file are loaded, chunked, embedded and kept
//! in a SQLite-persisted vector index. Questions are answered by a retrieval
//! chain and, when the grounded answer is unusable, from web search context.

pub mod chunker;
pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod loader;
pub mod rag;
pub mod store;
pub mod types;
pub mod vector_index;
pub mod web;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider};
pub use index::MemoryIndex;
pub use ingest::ingest_sources;
pub use loader::{load_sources_from_file, parse_sources, DocumentLoader, SourceDescriptor, SourceKind};
pub use rag::{Answer, AskOutcome, Bot, BotOptions, ChainFlavor, SourceDocument, SystemInfo};
pub use store::{Retriever, VectorStoreManager};
pub use types::{Document, IndexStats, IngestStats, RetrievedChunk};
pub use vector_index::VectorIndex;
pub use web::WebFallbackSearch;
