//! Generation provider abstraction and request/response types.
//!
//! The orchestration layer only ever needs "prompt in, completed text out".
//! Providers may still stream tokens; [`generate_text`] folds a stream into
//! one string so callers see a single terminal value either way.

use futures::{Stream, StreamExt};
use faqbot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// LLM completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The prompt text (user message)
    pub prompt: String,

    /// Model identifier (e.g., "llama3.2", "meta-llama/Llama-3.1-8B-Instruct")
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Use the provider's token stream
    #[serde(default)]
    pub stream: bool,

    /// System message (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl LlmRequest {
    /// Create a new LLM request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            stream: false,
            system: None,
        }
    }

    /// Enable or disable streaming for this request.
    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system message.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// LLM completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    pub usage: LlmUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A chunk from a streaming LLM response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmStreamChunk {
    /// Incremental text content
    pub content: String,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage statistics (only in final chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<LlmUsage>,
}

/// Stream of LLM chunks.
pub type LlmStream = Pin<Box<dyn Stream<Item = AppResult<LlmStreamChunk>> + Send>>;

/// Trait for generation providers.
///
/// Abstracts the underlying runtime (Ollama, an OpenAI-compatible server such
/// as vLLM) behind completion and streaming calls.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama", "openai").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;

    /// Perform a streaming completion.
    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream>;
}

/// Generate the full text for a request.
///
/// Streaming requests are drained until the final chunk; the caller gets the
/// concatenated tokens, never partial results.
pub async fn generate_text(client: &dyn LlmClient, request: &LlmRequest) -> AppResult<String> {
    if !request.stream {
        let response = client.complete(request).await?;
        tracing::debug!(
            "Completion from {}: {} chars, {} tokens",
            client.provider_name(),
            response.content.len(),
            response.usage.total_tokens
        );
        return Ok(response.content);
    }

    let mut stream = client.stream(request).await?;
    let mut content = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        content.push_str(&chunk.content);
        if chunk.done {
            if let Some(usage) = chunk.usage {
                tracing::debug!(
                    "Stream from {} finished: {} tokens",
                    client.provider_name(),
                    usage.total_tokens
                );
            }
            break;
        }
    }

    if content.is_empty() {
        return Err(AppError::Llm(format!(
            "{} returned an empty stream",
            client.provider_name()
        )));
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        tokens: Vec<&'static str>,
    }

    #[async_trait::async_trait]
    impl LlmClient for Scripted {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            Ok(LlmResponse {
                content: self.tokens.concat(),
                model: request.model.clone(),
                usage: LlmUsage::new(3, 4),
            })
        }

        async fn stream(&self, _request: &LlmRequest) -> AppResult<LlmStream> {
            let last = self.tokens.len().saturating_sub(1);
            let chunks: Vec<AppResult<LlmStreamChunk>> = self
                .tokens
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    Ok(LlmStreamChunk {
                        content: t.to_string(),
                        done: i == last,
                        usage: None,
                    })
                })
                .collect();
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::new("Hello", "llama3.2")
            .with_system("Be brief")
            .with_temperature(0.5)
            .with_max_tokens(64)
            .with_streaming(true);

        assert_eq!(request.system.as_deref(), Some("Be brief"));
        assert_eq!(request.temperature, Some(0.5));
        assert_eq!(request.max_tokens, Some(64));
        assert!(request.stream);
    }

    #[test]
    fn test_usage_total() {
        let usage = LlmUsage::new(10, 5);
        assert_eq!(usage.total_tokens, 15);
    }

    #[tokio::test]
    async fn test_generate_text_non_streaming() {
        let client = Scripted {
            tokens: vec!["Kigali ", "campus"],
        };
        let request = LlmRequest::new("where?", "m");
        let text = generate_text(&client, &request).await.unwrap();
        assert_eq!(text, "Kigali campus");
    }

    #[tokio::test]
    async fn test_generate_text_drains_stream() {
        let client = Scripted {
            tokens: vec!["The ", "campus ", "is in Kigali."],
        };
        let request = LlmRequest::new("where?", "m").with_streaming(true);
        let text = generate_text(&client, &request).await.unwrap();
        assert_eq!(text, "The campus is in Kigali.");
    }

    #[tokio::test]
    async fn test_generate_text_empty_stream_is_error() {
        let client = Scripted { tokens: vec![] };
        let request = LlmRequest::new("where?", "m").with_streaming(true);
        assert!(generate_text(&client, &request).await.is_err());
    }
}
