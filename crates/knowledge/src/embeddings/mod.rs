//! Embedding providers for chunk and query vectors.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
