//! Prompt types for the FAQ assistant.

use serde::{Deserialize, Serialize};

/// Default human message: the question alone.
pub const DEFAULT_HUMAN_TEMPLATE: &str = "{{question}}";

/// A named pair of system and human message templates.
///
/// Both templates use Handlebars slots; `{{context}}` and `{{question}}` are
/// always provided at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Catalog name
    pub name: String,

    /// System message template
    pub system: String,

    /// Human message template
    #[serde(default = "default_human")]
    pub human: String,
}

fn default_human() -> String {
    DEFAULT_HUMAN_TEMPLATE.to_string()
}

impl PromptTemplate {
    /// Create a template from its parts.
    pub fn new(
        name: impl Into<String>,
        system: impl Into<String>,
        human: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            system: system.into(),
            human: human.into(),
        }
    }
}

/// A prompt with all slots filled, ready for the generation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPrompt {
    /// System message
    pub system: String,

    /// User message
    pub user: String,

    /// Name of the template it was rendered from
    #[serde(rename = "sourcePrompt")]
    pub source_prompt: String,
}
