//! Error types for the FAQ assistant.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, generation, knowledge/retrieval,
//! prompts, and web search.

use thiserror::Error;

/// Unified error type for the FAQ assistant.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Errors are represented and propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing credentials, bad settings,
    /// uninitialized index)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge base, index and retrieval chain errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt catalog errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Web search provider errors
    #[error("Search error: {0}")]
    Search(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::Config("search API key missing".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: search API key missing"
        );
    }

    #[test]
    fn test_from_serde_json() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: AppError = parse.unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
