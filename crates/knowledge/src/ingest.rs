//! Ingestion: sources file to saved vector index.

use crate::loader::{load_sources_from_file, DocumentLoader};
use crate::store::VectorStoreManager;
use crate::types::IngestStats;
use faqbot_core::{AppError, AppResult};
use std::path::Path;
use std::time::Instant;

/// Load every source listed in `sources_file`, build the index and save it
/// to `store_path`.
///
/// # Errors
/// Fails when the file lists no usable sources, when no document yields
/// text, or when building or saving the index fails.
pub async fn ingest_sources(
    sources_file: &Path,
    store_path: &Path,
    loader: &DocumentLoader,
    store: &VectorStoreManager,
) -> AppResult<IngestStats> {
    let start = Instant::now();

    tracing::info!("Starting ingestion from {:?}", sources_file);

    let sources = load_sources_from_file(sources_file)?;
    if sources.is_empty() {
        return Err(AppError::Knowledge(format!(
            "No sources found in {:?}",
            sources_file
        )));
    }

    let documents = loader.load_all(&sources).await;
    if documents.is_empty() {
        return Err(AppError::Knowledge(
            "No documents processed from the listed sources".to_string(),
        ));
    }

    let chunks = store.create_index(&documents).await?;
    store.save(store_path)?;

    let duration = start.elapsed();

    tracing::info!(
        "Ingestion completed: {} sources, {} documents, {} chunks in {:.2}s",
        sources.len(),
        documents.len(),
        chunks,
        duration.as_secs_f64()
    );

    Ok(IngestStats {
        sources_listed: sources.len() as u32,
        documents_loaded: documents.len() as u32,
        chunks_indexed: chunks as u32,
        duration_secs: duration.as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::MockProvider;
    use crate::index::MemoryIndex;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store() -> VectorStoreManager {
        VectorStoreManager::new(Arc::new(MockProvider::new(128)))
    }

    #[tokio::test]
    async fn test_ingest_text_sources() {
        let temp = TempDir::new().unwrap();
        let faq = temp.path().join("faq.txt");
        std::fs::write(&faq, "Orientation week starts in mid August.").unwrap();
        let sources_file = temp.path().join("sources.txt");
        std::fs::write(
            &sources_file,
            format!(
                "# local docs\nfile, {}\nfile, {}\n",
                faq.display(),
                temp.path().join("missing.txt").display()
            ),
        )
        .unwrap();

        let store_path = temp.path().join("store");
        let loader = DocumentLoader::new().unwrap();
        let stats = ingest_sources(&sources_file, &store_path, &loader, &store())
            .await
            .unwrap();

        assert_eq!(stats.sources_listed, 2);
        assert_eq!(stats.documents_loaded, 1);
        assert_eq!(stats.chunks_indexed, 1);
        assert!(MemoryIndex::file_path(&store_path).exists());
    }

    #[tokio::test]
    async fn test_ingest_without_sources_fails() {
        let temp = TempDir::new().unwrap();
        let sources_file = temp.path().join("sources.txt");
        std::fs::write(&sources_file, "# nothing yet\n").unwrap();

        let loader = DocumentLoader::new().unwrap();
        let result = ingest_sources(&sources_file, &temp.path().join("store"), &loader, &store()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ingest_without_documents_fails() {
        let temp = TempDir::new().unwrap();
        let sources_file = temp.path().join("sources.txt");
        std::fs::write(&sources_file, "file, /definitely/not/here.txt\n").unwrap();

        let loader = DocumentLoader::new().unwrap();
        let store_path = temp.path().join("store");
        let result = ingest_sources(&sources_file, &store_path, &loader, &store()).await;

        assert!(result.unwrap_err().to_string().contains("No documents"));
        assert!(!store_path.exists());
    }
}
