//! Vector store lifecycle and retrieval.
//!
//! [`VectorStoreManager`] owns the embedder and the currently loaded index.
//! Building or loading swaps in a new `Arc` handle; readers that already
//! hold the previous handle keep using it unchanged.

use crate::chunker::chunk_documents;
use crate::embeddings::EmbeddingProvider;
use crate::index::MemoryIndex;
use crate::types::{Document, IndexStats, IndexedChunk, RetrievedChunk};
use crate::vector_index::VectorIndex;
use faqbot_core::{AppError, AppResult};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Default number of chunks returned per query.
pub const DEFAULT_TOP_K: usize = 3;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default chunk overlap in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Anything that returns ranked chunks for a query.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve chunks for `query`, best match first.
    async fn retrieve(&self, query: &str) -> AppResult<Vec<RetrievedChunk>>;
}

/// Retriever over one index snapshot.
pub struct IndexRetriever {
    index: Arc<MemoryIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    k: usize,
}

impl IndexRetriever {
    pub fn new(index: Arc<MemoryIndex>, embedder: Arc<dyn EmbeddingProvider>, k: usize) -> Self {
        Self { index, embedder, k }
    }

    /// Number of chunks returned per query.
    pub fn k(&self) -> usize {
        self.k
    }
}

#[async_trait::async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str) -> AppResult<Vec<RetrievedChunk>> {
        search_index(&self.index, self.embedder.as_ref(), query, self.k).await
    }
}

async fn search_index(
    index: &MemoryIndex,
    embedder: &dyn EmbeddingProvider,
    query: &str,
    k: usize,
) -> AppResult<Vec<RetrievedChunk>> {
    let query_embedding = embedder.embed(query).await?;
    let results = index.search(&query_embedding, k)?;

    Ok(results
        .into_iter()
        .map(|(chunk, score)| RetrievedChunk {
            text: chunk.text,
            metadata: chunk.metadata,
            position: chunk.position,
            score,
        })
        .collect())
}

/// Owns the embedder and the active index.
pub struct VectorStoreManager {
    embedder: Arc<dyn EmbeddingProvider>,
    index: RwLock<Option<Arc<MemoryIndex>>>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl VectorStoreManager {
    /// Create a manager with default chunking.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_chunking(embedder, DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }

    /// Create a manager with explicit chunk size and overlap.
    pub fn with_chunking(
        embedder: Arc<dyn EmbeddingProvider>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            embedder,
            index: RwLock::new(None),
            chunk_size,
            chunk_overlap,
        }
    }

    /// The embedding provider used for chunks and queries.
    pub fn embedder(&self) -> Arc<dyn EmbeddingProvider> {
        Arc::clone(&self.embedder)
    }

    /// Chunk, embed and index `documents`, replacing the active index.
    ///
    /// Returns the number of chunks indexed.
    pub async fn create_index(&self, documents: &[Document]) -> AppResult<usize> {
        if documents.is_empty() {
            return Err(AppError::Knowledge(
                "No documents provided for vector store creation".to_string(),
            ));
        }

        let candidates = chunk_documents(documents, self.chunk_size, self.chunk_overlap);
        if candidates.is_empty() {
            return Err(AppError::Knowledge(
                "Documents produced no chunks".to_string(),
            ));
        }

        let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();

        tracing::info!(
            "Embedding {} chunks using provider '{}' (model: {})",
            texts.len(),
            self.embedder.provider_name(),
            self.embedder.model_name()
        );

        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != candidates.len() {
            return Err(AppError::Knowledge(format!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                candidates.len()
            )));
        }

        let chunks: Vec<IndexedChunk> = candidates
            .into_iter()
            .zip(embeddings)
            .map(|(candidate, embedding)| IndexedChunk {
                id: uuid::Uuid::new_v4().to_string(),
                position: candidate.position,
                text: candidate.text,
                metadata: candidate.metadata,
                embedding,
            })
            .collect();

        let count = chunks.len();
        let index = MemoryIndex::build(chunks)?;
        self.install(Arc::new(index))?;

        tracing::info!("Vector store created with {} chunks", count);
        Ok(count)
    }

    /// Persist the active index into `path`.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        self.current()?.save(path)
    }

    /// Load the index stored at `path`, replacing the active one on success.
    ///
    /// On failure the previously active index stays in place.
    pub fn load(&self, path: &Path) -> AppResult<()> {
        let index = self.open(path)?;
        self.install(index)
    }

    /// Load the index at `path` without touching the active one.
    ///
    /// The index must match the embedder's dimensions.
    pub fn open(&self, path: &Path) -> AppResult<Arc<MemoryIndex>> {
        let index = MemoryIndex::load(path)?;

        if index.dimensions() != self.embedder.dimensions() {
            return Err(AppError::Config(format!(
                "Index at {:?} has {} dimensions but embedder '{}' produces {}",
                path,
                index.dimensions(),
                self.embedder.model_name(),
                self.embedder.dimensions()
            )));
        }

        Ok(Arc::new(index))
    }

    /// Make `index` the active index.
    pub fn install(&self, index: Arc<MemoryIndex>) -> AppResult<()> {
        let mut guard = self
            .index
            .write()
            .map_err(|_| AppError::Knowledge("Vector store lock poisoned".to_string()))?;
        *guard = Some(index);
        Ok(())
    }

    /// Whether an index is active.
    pub fn is_loaded(&self) -> bool {
        self.index.read().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Statistics of the active index, if any.
    pub fn stats(&self) -> Option<IndexStats> {
        self.current().ok().map(|index| index.stats())
    }

    /// A retriever returning the top `k` chunks of the active index.
    pub fn retriever(&self, k: usize) -> AppResult<IndexRetriever> {
        Ok(self.retriever_for(self.current()?, k))
    }

    /// A retriever over a specific index snapshot.
    pub fn retriever_for(&self, index: Arc<MemoryIndex>, k: usize) -> IndexRetriever {
        IndexRetriever::new(index, self.embedder(), k)
    }

    /// Top-k chunks of the active index for `query`.
    pub async fn similarity_search(&self, query: &str, k: usize) -> AppResult<Vec<RetrievedChunk>> {
        let index = self.current()?;
        search_index(&index, self.embedder.as_ref(), query, k).await
    }

    fn current(&self) -> AppResult<Arc<MemoryIndex>> {
        let guard = self
            .index
            .read()
            .map_err(|_| AppError::Knowledge("Vector store lock poisoned".to_string()))?;
        guard
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| AppError::Config("vector store not initialized".to_string()))
    }
}
