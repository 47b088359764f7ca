//! Ollama generation provider.
//!
//! Talks to a local Ollama runtime through `/api/generate`.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use faqbot_core::{AppError, AppResult};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama API response format (also one line of the NDJSON stream).
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    response: String,
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl OllamaResponse {
    fn usage(&self) -> LlmUsage {
        LlmUsage::new(
            self.prompt_eval_count.unwrap_or(0),
            self.eval_count.unwrap_or(0),
        )
    }
}

/// Ollama LLM client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client with default settings.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OLLAMA_URL)
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client whose requests time out after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Convert LlmRequest to Ollama format.
    fn to_ollama_request(&self, request: &LlmRequest, stream: bool) -> OllamaRequest {
        let options = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            })
        } else {
            None
        };

        OllamaRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            options,
            stream,
        }
    }

    async fn post(&self, body: &OllamaRequest) -> AppResult<reqwest::Response> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(model = %request.model, prompt_len = request.prompt.len(), "Ollama completion");

        let response = self.post(&self.to_ollama_request(request, false)).await?;

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        let usage = ollama_response.usage();
        Ok(LlmResponse {
            content: ollama_response.response,
            model: ollama_response.model,
            usage,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::debug!(model = %request.model, "Ollama streaming completion");

        let response = self.post(&self.to_ollama_request(request, true)).await?;

        // Ollama sends newline-delimited JSON
        let stream = response.bytes_stream().map(|result| {
            let bytes = result.map_err(|e| AppError::Llm(format!("Stream error: {}", e)))?;
            let text = String::from_utf8_lossy(&bytes);

            let chunks: Vec<AppResult<LlmStreamChunk>> = text
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(parse_stream_line)
                .collect();

            Ok(futures::stream::iter(chunks))
        });

        Ok(Box::pin(stream.flat_map(|result| match result {
            Ok(chunks) => chunks,
            Err(e) => futures::stream::iter(vec![Err(e)]),
        })))
    }
}

fn parse_stream_line(line: &str) -> AppResult<LlmStreamChunk> {
    let parsed: OllamaResponse = serde_json::from_str(line)
        .map_err(|e| AppError::Llm(format!("Failed to parse chunk: {}", e)))?;

    let usage = parsed.done.then(|| parsed.usage());
    Ok(LlmStreamChunk {
        content: parsed.response,
        done: parsed.done,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::new();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OllamaClient::with_base_url("http://gpu-box:11434/");
        assert_eq!(client.base_url, "http://gpu-box:11434");
    }

    #[test]
    fn test_ollama_request_conversion() {
        let client = OllamaClient::new();
        let request = LlmRequest::new("Hello", "llama3.2")
            .with_temperature(0.5)
            .with_max_tokens(100);

        let ollama_req = client.to_ollama_request(&request, false);
        assert_eq!(ollama_req.model, "llama3.2");
        assert_eq!(ollama_req.prompt, "Hello");
        let options = ollama_req.options.unwrap();
        assert_eq!(options.temperature, Some(0.5));
        assert_eq!(options.num_predict, Some(100));
        assert!(!ollama_req.stream);
    }

    #[test]
    fn test_parse_stream_line() {
        let chunk = parse_stream_line(r#"{"model":"m","response":"Hi","done":false}"#).unwrap();
        assert_eq!(chunk.content, "Hi");
        assert!(chunk.usage.is_none());

        let last = parse_stream_line(
            r#"{"model":"m","response":"","done":true,"prompt_eval_count":5,"eval_count":7}"#,
        )
        .unwrap();
        assert!(last.done);
        assert_eq!(last.usage.unwrap().total_tokens, 12);
    }
}
