//! Named prompt templates with built-in defaults.

use crate::types::{PromptTemplate, DEFAULT_HUMAN_TEMPLATE};
use std::collections::BTreeMap;

/// Name of the detailed, context-only template.
pub const STRICT: &str = "strict";

/// Name of the short-answer template; also the lookup fallback.
pub const CONCISE: &str = "concise";

const STRICT_SYSTEM: &str = "You are a knowledgeable and friendly FAQ assistant designed to help users with accurate, reliable answers across a wide range of frequently asked questions. Your role is to respond clearly using only the provided context or official sources.

Communication Style:
- Friendly, professional, and helpful
- Use structured formatting (headers, bullet points, bold text) for clarity
- Use emojis sparingly to keep things engaging
- Avoid technical jargon; explain terms simply
- Be empathetic and user-focused in tone

STRICT RULES:
- Only answer questions related to CMU Africa using information from the provided context or official, verified sources.
- Do not guess, make assumptions, or rely on general knowledge or memory.
- Always check your knowledge base before responding.
- Ensure all information aligns with current CMU-Africa policies, deadlines, and Rwandan regulations.
- If a question is unclear, ask follow-up questions to better understand the user's needs.
- If a question is outside your scope, politely redirect the user to the relevant department or resource.
- Never collect or store personal information.
- Be helpful, but stay within the bounds of your knowledge base.

📘 Context: {{context}}

✅ Only respond using the information in the context above. If it's not there, provide a polite response indicating that the information is not available and suggest checking official sources or contacting the relevant department. Do not give sources if you don't have an answer.";

const CONCISE_SYSTEM: &str = "You are a smart and friendly FAQ assistant. Provide short, accurate answers using only the context provided.

📘 Context: {{context}}

✍️ Keep your response concise, helpful, and based strictly on the available information.";

/// Mapping from name to prompt template.
///
/// `strict` and `concise` are always present; custom entries overwrite by
/// name.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    prompts: BTreeMap<String, PromptTemplate>,
    fallback: PromptTemplate,
}

impl PromptCatalog {
    /// Create a catalog holding the built-in templates.
    pub fn new() -> Self {
        let concise = PromptTemplate::new(CONCISE, CONCISE_SYSTEM, DEFAULT_HUMAN_TEMPLATE);
        let mut catalog = Self {
            prompts: BTreeMap::new(),
            fallback: concise.clone(),
        };
        catalog.insert(PromptTemplate::new(
            STRICT,
            STRICT_SYSTEM,
            DEFAULT_HUMAN_TEMPLATE,
        ));
        catalog.insert(concise);
        catalog
    }

    /// Look up a template, falling back to `concise` for unknown names.
    pub fn get(&self, name: &str) -> &PromptTemplate {
        if let Some(template) = self.prompts.get(name) {
            return template;
        }

        tracing::warn!("Prompt type '{}' not found, using '{}'", name, CONCISE);
        &self.fallback
    }

    /// Whether a template with this exact name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.prompts.contains_key(name)
    }

    /// Register a template, replacing any existing one with the same name.
    ///
    /// `human` defaults to `{{question}}`.
    pub fn add_custom(&mut self, name: &str, system: &str, human: Option<&str>) {
        let human = human.unwrap_or(DEFAULT_HUMAN_TEMPLATE);
        if self.prompts.contains_key(name) {
            tracing::info!("Replacing prompt '{}'", name);
        } else {
            tracing::info!("Registered prompt '{}'", name);
        }
        self.insert(PromptTemplate::new(name, system, human));
    }

    /// Register an already-built template.
    pub fn insert(&mut self, template: PromptTemplate) {
        if template.name == CONCISE {
            self.fallback = template.clone();
        }
        self.prompts.insert(template.name.clone(), template);
    }

    /// Names of all templates, sorted.
    pub fn list(&self) -> Vec<String> {
        self.prompts.keys().cloned().collect()
    }
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::render;

    #[test]
    fn test_builtins_present() {
        let catalog = PromptCatalog::new();
        assert_eq!(catalog.list(), vec!["concise".to_string(), "strict".to_string()]);
        assert!(catalog.get("strict").system.contains("STRICT RULES"));
    }

    #[test]
    fn test_unknown_name_falls_back_to_concise() {
        let catalog = PromptCatalog::new();
        let template = catalog.get("does-not-exist");
        assert_eq!(template.name, "concise");
    }

    #[test]
    fn test_add_custom_overwrites_by_name() {
        let mut catalog = PromptCatalog::new();
        catalog.add_custom("admissions", "Admissions only. {{context}}", None);
        catalog.add_custom("admissions", "Admissions v2. {{context}}", Some("Q: {{question}}"));

        let template = catalog.get("admissions");
        assert_eq!(template.system, "Admissions v2. {{context}}");
        assert_eq!(template.human, "Q: {{question}}");
        assert_eq!(catalog.list().len(), 3);
    }

    #[test]
    fn test_overwritten_concise_is_new_fallback() {
        let mut catalog = PromptCatalog::new();
        catalog.add_custom("concise", "Two sentences max. {{context}}", None);
        assert_eq!(catalog.get("missing").system, "Two sentences max. {{context}}");
    }

    #[test]
    fn test_custom_human_defaults_to_question() {
        let mut catalog = PromptCatalog::new();
        catalog.add_custom("housing", "Housing office. {{context}}", None);
        assert_eq!(catalog.get("housing").human, "{{question}}");
    }

    #[test]
    fn test_builtins_render_slots() {
        let catalog = PromptCatalog::new();
        for name in [STRICT, CONCISE] {
            let rendered = render(catalog.get(name), "Campus is in Kigali.", "Where is campus?").unwrap();
            assert!(rendered.system.contains("Context: Campus is in Kigali."));
            assert_eq!(rendered.user, "Where is campus?");
        }
    }
}
