//! LLM provider factory.
//!
//! Resolves a provider name from configuration into a ready client.

use crate::client::LlmClient;
use crate::providers::{ollama::DEFAULT_OLLAMA_URL, openai::DEFAULT_OPENAI_URL};
use crate::providers::{OllamaClient, OpenAiClient};
use faqbot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Supported generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Local Ollama runtime
    Ollama,
    /// OpenAI or any OpenAI-compatible server
    OpenAi,
}

impl ProviderType {
    /// Parse a provider name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "vllm" => Some(Self::OpenAi),
            _ => None,
        }
    }

    /// Whether this provider needs an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAi)
    }
}

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openai")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key for providers that require one
/// * `timeout` - Per-request HTTP timeout
///
/// # Errors
/// Returns a config error if the provider is unknown or its key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_URL);
            tracing::debug!("Creating Ollama client for {}", base_url);
            Ok(Arc::new(OllamaClient::with_timeout(base_url, timeout)?))
        }
        ProviderType::OpenAi => {
            let api_key = api_key
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| AppError::Config("OpenAI provider requires API key".to_string()))?;
            let base_url = endpoint.unwrap_or(DEFAULT_OPENAI_URL);
            tracing::debug!("Creating OpenAI-compatible client for {}", base_url);
            Ok(Arc::new(OpenAiClient::new(base_url, api_key, timeout)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(30);

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None, TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("Ollama", Some("http://localhost:8080"), None, TIMEOUT);
        assert!(client.is_ok());
    }

    #[test]
    fn test_openai_requires_api_key() {
        match create_client("openai", None, None, TIMEOUT) {
            Err(err) => assert!(err.to_string().contains("requires API key")),
            Ok(_) => panic!("Expected error for OpenAI without API key"),
        }
        assert!(create_client("openai", None, Some("  "), TIMEOUT).is_err());
    }

    #[test]
    fn test_create_openai_client() {
        let client = create_client("openai", None, Some("sk-test"), TIMEOUT).unwrap();
        assert_eq!(client.provider_name(), "openai");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None, TIMEOUT) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }

    #[test]
    fn test_provider_type_parse() {
        assert_eq!(ProviderType::parse("vllm"), Some(ProviderType::OpenAi));
        assert!(ProviderType::OpenAi.requires_api_key());
        assert!(!ProviderType::Ollama.requires_api_key());
    }
}
