//! Answer and status types returned by the orchestrator.

use crate::types::{IndexStats, RetrievedChunk};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source tag of answers generated from web search context.
pub const WEB_SEARCH_SOURCE: &str = "www.google.com, Google Search";

/// Answer text when no chain is configured.
pub const NO_CHAIN_MESSAGE: &str = "No QA chain available. Please run setup first.";

/// Answer text when processing failed.
pub const ERROR_MESSAGE: &str = "Sorry, I encountered an error processing your question.";

/// Named inputs of a chain invocation.
pub type ChainInput = HashMap<String, String>;

/// A document backing an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Passage text
    pub text: String,

    /// Origin identifier
    pub source: String,

    /// "url", "file" or "web_search"
    #[serde(rename = "type")]
    pub source_type: String,

    /// Similarity score for retrieved passages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl SourceDocument {
    /// The synthetic source attached to a web-search answer.
    pub fn web_search(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: WEB_SEARCH_SOURCE.to_string(),
            source_type: "web_search".to_string(),
            score: None,
        }
    }
}

impl From<RetrievedChunk> for SourceDocument {
    fn from(chunk: RetrievedChunk) -> Self {
        Self {
            text: chunk.text,
            source: chunk.metadata.source,
            source_type: chunk.metadata.source_type,
            score: Some(chunk.score),
        }
    }
}

/// Result of one chain invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainOutput {
    /// Generated answer
    pub answer: String,

    /// Retrieved passages the answer was generated from
    pub source_documents: Vec<RetrievedChunk>,
}

/// The unit of response for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SourceDocument>,
    pub fallback_used: bool,
}

/// Outcome of asking a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AskOutcome {
    /// An answer was produced
    Answered(Answer),
    /// No chain was set up
    NoChainConfigured,
    /// Chain, search or generation failed
    InternalError { message: String },
}

impl AskOutcome {
    /// Text to show the user.
    pub fn answer_text(&self) -> &str {
        match self {
            Self::Answered(answer) => &answer.text,
            Self::NoChainConfigured => NO_CHAIN_MESSAGE,
            Self::InternalError { .. } => ERROR_MESSAGE,
        }
    }

    /// Sources of the answer; empty unless answered.
    pub fn sources(&self) -> &[SourceDocument] {
        match self {
            Self::Answered(answer) => &answer.sources,
            _ => &[],
        }
    }

    pub fn fallback_used(&self) -> bool {
        matches!(self, Self::Answered(answer) if answer.fallback_used)
    }

    pub fn answer(&self) -> Option<&Answer> {
        match self {
            Self::Answered(answer) => Some(answer),
            _ => None,
        }
    }
}

/// Status snapshot of an orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub available_prompts: Vec<String>,
    pub available_chains: Vec<String>,
    pub vectorstore_loaded: bool,
    pub memory_active: bool,
    pub current_chain_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_texts() {
        assert_eq!(AskOutcome::NoChainConfigured.answer_text(), NO_CHAIN_MESSAGE);
        let failed = AskOutcome::InternalError {
            message: "llm down".to_string(),
        };
        assert_eq!(failed.answer_text(), ERROR_MESSAGE);
        assert!(failed.sources().is_empty());
        assert!(!failed.fallback_used());
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let outcome = AskOutcome::Answered(Answer {
            text: "Kigali".to_string(),
            sources: vec![SourceDocument::web_search("Kigali")],
            fallback_used: true,
        });

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "answered");
        assert_eq!(json["fallback_used"], true);
        assert_eq!(json["sources"][0]["source"], WEB_SEARCH_SOURCE);
        assert!(json["sources"][0].get("score").is_none());
    }
}
