//! OpenAI-compatible chat completion provider.
//!
//! Works against any server exposing `/v1/chat/completions` (OpenAI itself,
//! vLLM, llama.cpp server). Authentication is a bearer token.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use faqbot_core::{AppError, AppResult};
use futures::StreamExt;
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenAI endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// OpenAI-compatible chat client.
pub struct OpenAiClient {
    client: reqwest::Client,
    url_chat: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Delta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client for `endpoint` authenticated with `api_key`.
    ///
    /// The endpoint must use http or https; a trailing `/v1` is tolerated.
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> AppResult<Self> {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "Invalid OpenAI endpoint: {:?}",
                endpoint
            )));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| AppError::Config(format!("Invalid API key header: {}", e)))?,
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        let base = endpoint.trim_end_matches('/').trim_end_matches("/v1");
        let url_chat = format!("{}/v1/chat/completions", base);

        tracing::debug!("OpenAI-compatible client targeting {}", url_chat);

        Ok(Self { client, url_chat })
    }

    fn body<'a>(request: &'a LlmRequest, stream: bool) -> ChatCompletionRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatCompletionRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream,
        }
    }

    async fn post(&self, body: &ChatCompletionRequest<'_>) -> AppResult<reqwest::Response> {
        let response = self
            .client
            .post(&self.url_chat)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send chat request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            tracing::error!(%status, url = %self.url_chat, %snippet, "chat completion failed");
            return Err(AppError::Llm(format!(
                "Chat completion error ({}): {}",
                status, snippet
            )));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let response = self.post(&Self::body(request, false)).await?;

        let out: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::Llm(format!(
                "Failed to decode chat completion (expected choices[0].message.content): {}",
                e
            ))
        })?;

        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| AppError::Llm("Chat completion returned no choices".to_string()))?;

        let usage = out
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: out.model,
            usage,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        let response = self.post(&Self::body(request, true)).await?;

        let stream = response.bytes_stream().map(|result| {
            let bytes = result.map_err(|e| AppError::Llm(format!("Stream error: {}", e)))?;
            let text = String::from_utf8_lossy(&bytes);

            let chunks: Vec<AppResult<LlmStreamChunk>> =
                text.lines().filter_map(parse_sse_line).collect();

            Ok(futures::stream::iter(chunks))
        });

        Ok(Box::pin(stream.flat_map(|result| match result {
            Ok(chunks) => chunks,
            Err(e) => futures::stream::iter(vec![Err(e)]),
        })))
    }
}

/// Parse one server-sent-events line. Non-data lines yield nothing.
fn parse_sse_line(line: &str) -> Option<AppResult<LlmStreamChunk>> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }

    if data == "[DONE]" {
        return Some(Ok(LlmStreamChunk {
            content: String::new(),
            done: true,
            usage: None,
        }));
    }

    let event: StreamEvent = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(e) => return Some(Err(AppError::Llm(format!("Failed to parse chunk: {}", e)))),
    };

    let choice = event.choices.into_iter().next()?;
    Some(Ok(LlmStreamChunk {
        content: choice.delta.content.unwrap_or_default(),
        done: choice.finish_reason.is_some(),
        usage: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_endpoint() {
        let result = OpenAiClient::new("localhost:8000", "key", Duration::from_secs(5));
        assert!(result.is_err());
    }

    #[test]
    fn test_chat_url_normalized() {
        let client =
            OpenAiClient::new("http://10.0.0.5:8000/v1/", "key", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url_chat, "http://10.0.0.5:8000/v1/chat/completions");
        assert_eq!(client.provider_name(), "openai");
    }

    #[test]
    fn test_body_includes_system_message() {
        let request = LlmRequest::new("When is orientation?", "m").with_system("Be brief");
        let body = OpenAiClient::body(&request, false);
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].content, "When is orientation?");
    }

    #[test]
    fn test_parse_sse_lines() {
        let chunk = parse_sse_line(r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(chunk.content, "Hel");
        assert!(!chunk.done);

        let done = parse_sse_line("data: [DONE]").unwrap().unwrap();
        assert!(done.done);

        assert!(parse_sse_line(": keep-alive").is_none());
    }
}
