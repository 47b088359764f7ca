//! Embedding provider trait and factory.

use super::providers::{MockProvider, OllamaProvider, OpenAiProvider};
use faqbot_core::config::EmbeddingSettings;
use faqbot_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts, one vector per text in order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from configuration.
pub fn create_provider(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    tracing::debug!(
        "Creating embedding provider: provider={}, model={}, dimensions={}",
        settings.provider,
        settings.model,
        settings.dimensions
    );

    match settings.provider.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockProvider::new(settings.dimensions))),

        "ollama" => Ok(Arc::new(OllamaProvider::new(
            settings.endpoint.as_deref(),
            &settings.model,
            settings.dimensions,
        )?)),

        "openai" => {
            let api_key = settings.api_key.as_deref().ok_or_else(|| {
                AppError::Config("OpenAI embedding provider requires API key".to_string())
            })?;
            Ok(Arc::new(OpenAiProvider::new(
                settings.endpoint.as_deref(),
                api_key,
                &settings.model,
                settings.dimensions,
            )?))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: mock, ollama, openai",
            settings.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: provider.to_string(),
            dimensions: 384,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_mock_provider() {
        let provider = create_provider(&settings("mock")).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_create_ollama_provider() {
        let provider = create_provider(&settings("ollama")).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
    }

    #[test]
    fn test_openai_requires_key() {
        let err = create_provider(&settings("openai")).unwrap_err();
        assert!(err.to_string().contains("requires API key"));

        let mut with_key = settings("openai");
        with_key.api_key = Some("sk-test".to_string());
        assert!(create_provider(&with_key).is_ok());
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider(&settings("unknown"));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&settings("mock")).unwrap();
        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
