//! OpenAI-compatible embedding provider (`/v1/embeddings`).

use crate::embeddings::provider::EmbeddingProvider;
use faqbot_core::{AppError, AppResult};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// Texts per request
const BATCH_SIZE: usize = 64;

/// OpenAI embedding provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    /// Create a provider authenticated with `api_key`.
    pub fn new(
        endpoint: Option<&str>,
        api_key: &str,
        model: &str,
        dimensions: usize,
    ) -> AppResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| AppError::Config(format!("Invalid API key header: {}", e)))?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Knowledge(format!("Failed to build HTTP client: {}", e)))?;

        let base = endpoint
            .unwrap_or(DEFAULT_OPENAI_URL)
            .trim_end_matches('/')
            .trim_end_matches("/v1");

        Ok(Self {
            client,
            url: format!("{}/v1/embeddings", base),
            model: model.to_string(),
            dimensions,
        })
    }

    async fn embed_request(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(&self.url)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to send embedding request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Knowledge(format!(
                "Embedding API error ({}): {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to parse embedding response: {}", e)))?;

        if body.data.len() != texts.len() {
            return Err(AppError::Knowledge(format!(
                "Embedding API returned {} vectors for {} inputs",
                body.data.len(),
                texts.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        body.data
            .into_iter()
            .map(|d| {
                if d.embedding.len() == self.dimensions {
                    Ok(d.embedding)
                } else {
                    Err(AppError::Knowledge(format!(
                        "Embedding model '{}' returned {} dimensions, expected {}",
                        self.model,
                        d.embedding.len(),
                        self.dimensions
                    )))
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            tracing::debug!("Embedding batch of {} texts via {}", batch.len(), self.url);
            embeddings.extend(self.embed_request(batch).await?);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_normalization() {
        let provider =
            OpenAiProvider::new(Some("http://vllm:8000/v1/"), "k", "text-embedding-3-small", 1536)
                .unwrap();
        assert_eq!(provider.url, "http://vllm:8000/v1/embeddings");

        let default = OpenAiProvider::new(None, "k", "text-embedding-3-small", 1536).unwrap();
        assert_eq!(default.url, "https://api.openai.com/v1/embeddings");
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_requests() {
        let provider = OpenAiProvider::new(Some("http://127.0.0.1:9"), "k", "m", 8).unwrap();
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"data":[{"index":1,"embedding":[0.5]},{"index":0,"embedding":[0.25]}]}"#;
        let mut body: EmbeddingResponse = serde_json::from_str(json).unwrap();
        body.data.sort_by_key(|d| d.index);
        assert_eq!(body.data[0].embedding, vec![0.25]);
    }
}
