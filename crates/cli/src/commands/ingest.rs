//! Ingest command handler.

use super::print_json;
use clap::Args;
use faqbot_core::{config::AppConfig, AppResult};
use faqbot_knowledge::{create_provider, ingest_sources, DocumentLoader, VectorStoreManager};
use std::path::PathBuf;

/// Load the listed sources and build the vector store
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Sources file (default: store.sourcesFile from config)
    #[arg(short, long)]
    pub sources: Option<PathBuf>,

    /// Store directory (default: store.path from config)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let sources = self.sources.clone().unwrap_or_else(|| config.sources_path());
        let store_path = self.store.clone().unwrap_or_else(|| config.store_path());

        tracing::info!("Ingesting {:?} into {:?}", sources, store_path);

        let embedder = create_provider(&config.embedding)?;
        let store = VectorStoreManager::with_chunking(
            embedder,
            config.store.chunk_size,
            config.store.chunk_overlap,
        );
        let loader = DocumentLoader::new()?;

        let stats = ingest_sources(&sources, &store_path, &loader, &store).await?;

        if self.json {
            print_json(&serde_json::json!({
                "store": store_path,
                "sourcesListed": stats.sources_listed,
                "documentsLoaded": stats.documents_loaded,
                "chunksIndexed": stats.chunks_indexed,
                "durationSecs": stats.duration_secs,
            }))?;
        } else {
            println!(
                "Indexed {} chunks from {} of {} sources in {:.2}s",
                stats.chunks_indexed,
                stats.documents_loaded,
                stats.sources_listed,
                stats.duration_secs
            );
        }

        Ok(())
    }
}
