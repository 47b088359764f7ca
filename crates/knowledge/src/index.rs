//! In-memory vector index persisted as a SQLite file.

use crate::types::{IndexStats, IndexedChunk};
use crate::vector_index::VectorIndex;
use chrono::Utc;
use faqbot_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name of the index inside a store directory.
pub const INDEX_FILE: &str = "index.sqlite";

/// Immutable brute-force cosine index.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    chunks: Vec<IndexedChunk>,
    dimensions: usize,
}

impl MemoryIndex {
    /// Build an index from embedded chunks.
    ///
    /// Every embedding must have the same, non-zero length.
    pub fn build(chunks: Vec<IndexedChunk>) -> AppResult<Self> {
        let dimensions = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);

        if dimensions == 0 {
            return Err(AppError::Knowledge(
                "Cannot build an index without embedded chunks".to_string(),
            ));
        }

        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dimensions) {
            return Err(AppError::Knowledge(format!(
                "Embedding dimension mismatch for chunk {}: got {}, expected {}",
                bad.id,
                bad.embedding.len(),
                dimensions
            )));
        }

        Ok(Self { chunks, dimensions })
    }

    /// Embedding dimensions of the indexed chunks.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Path of the index file inside `dir`.
    pub fn file_path(dir: &Path) -> PathBuf {
        dir.join(INDEX_FILE)
    }

    /// Persist the index into `dir`, replacing any previous index there.
    pub fn save(&self, dir: &Path) -> AppResult<()> {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::Knowledge(format!("Failed to create store directory: {}", e)))?;

        let path = Self::file_path(dir);
        let mut conn = Connection::open(&path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

        init_schema(&conn)?;

        let tx = conn
            .transaction()
            .map_err(|e| AppError::Knowledge(format!("Failed to begin transaction: {}", e)))?;

        tx.execute("DELETE FROM chunks", [])
            .map_err(|e| AppError::Knowledge(format!("Failed to clear chunks: {}", e)))?;
        tx.execute("DELETE FROM meta", [])
            .map_err(|e| AppError::Knowledge(format!("Failed to clear metadata: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO chunks (id, position, text, metadata, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(|e| AppError::Knowledge(format!("Failed to prepare insert: {}", e)))?;

            for chunk in &self.chunks {
                let metadata = serde_json::to_string(&chunk.metadata)?;
                stmt.execute(params![
                    chunk.id,
                    chunk.position as i64,
                    chunk.text,
                    metadata,
                    embedding_to_bytes(&chunk.embedding),
                ])
                .map_err(|e| AppError::Knowledge(format!("Failed to insert chunk: {}", e)))?;
            }
        }

        tx.execute(
            "INSERT INTO meta (key, value) VALUES ('dimensions', ?1), ('saved_at', ?2)",
            params![self.dimensions.to_string(), Utc::now().to_rfc3339()],
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to write metadata: {}", e)))?;

        tx.commit()
            .map_err(|e| AppError::Knowledge(format!("Failed to commit index: {}", e)))?;

        tracing::info!("Saved {} chunks to {:?}", self.chunks.len(), path);
        Ok(())
    }

    /// Load an index previously saved into `dir`.
    ///
    /// A missing directory or index file is an error.
    pub fn load(dir: &Path) -> AppResult<Self> {
        let path = Self::file_path(dir);
        if !path.is_file() {
            return Err(AppError::Knowledge(format!(
                "No vector index found at {:?}",
                path
            )));
        }

        let conn = Connection::open(&path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

        let dimensions: Option<String> = conn
            .query_row("SELECT value FROM meta WHERE key = 'dimensions'", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| AppError::Knowledge(format!("Failed to read index metadata: {}", e)))?;

        let mut stmt = conn
            .prepare("SELECT id, position, text, metadata, embedding FROM chunks ORDER BY rowid")
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Vec<u8>>(4)?,
                ))
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to query chunks: {}", e)))?;

        let mut chunks = Vec::new();
        for row in rows {
            let (id, position, text, metadata, embedding) =
                row.map_err(|e| AppError::Knowledge(format!("Failed to read chunk: {}", e)))?;
            chunks.push(IndexedChunk {
                id,
                position: position as u32,
                text,
                metadata: serde_json::from_str(&metadata)?,
                embedding: bytes_to_embedding(&embedding)?,
            });
        }

        let index = Self::build(chunks)?;

        if let Some(stored) = dimensions.and_then(|d| d.parse::<usize>().ok()) {
            if stored != index.dimensions {
                return Err(AppError::Knowledge(format!(
                    "Index metadata says {} dimensions but chunks have {}",
                    stored, index.dimensions
                )));
            }
        }

        tracing::info!("Loaded {} chunks from {:?}", index.chunks.len(), path);
        Ok(index)
    }
}

impl VectorIndex for MemoryIndex {
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<(IndexedChunk, f32)>> {
        if query_embedding.len() != self.dimensions {
            return Err(AppError::Knowledge(format!(
                "Query embedding has {} dimensions, index has {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(query_embedding, &chunk.embedding)))
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        tracing::debug!(
            "Retrieved {} chunks (requested top-{}), scores: {:?}",
            scored.len(),
            top_k,
            scored.iter().map(|(_, s)| *s).collect::<Vec<_>>()
        );

        Ok(scored
            .into_iter()
            .map(|(i, score)| (self.chunks[i].clone(), score))
            .collect())
    }

    fn stats(&self) -> IndexStats {
        let sources: HashSet<&str> = self
            .chunks
            .iter()
            .map(|c| c.metadata.source.as_str())
            .collect();

        IndexStats {
            sources_count: sources.len() as u32,
            chunks_count: self.chunks.len() as u32,
            dimensions: self.dimensions,
        }
    }
}

fn init_schema(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            metadata TEXT NOT NULL,
            embedding BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
