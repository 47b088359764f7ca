//! LLM integration crate for the FAQ assistant.
//!
//! Provider-agnostic access to text generation behind the [`LlmClient`]
//! trait.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: OpenAI or any OpenAI-compatible server
//!
//! # Example
//! ```no_run
//! use faqbot_llm::{generate_text, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let text = generate_text(&client, &request).await?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

pub use client::{
    generate_text, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
pub use factory::{create_client, ProviderType};
pub use providers::{OllamaClient, OpenAiClient};
