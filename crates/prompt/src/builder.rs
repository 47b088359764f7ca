//! Prompt rendering.

use crate::types::{PromptTemplate, RenderedPrompt};
use faqbot_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Render a template with retrieved context and the user question.
///
/// # Example
/// ```no_run
/// use faqbot_prompt::{render, PromptCatalog};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = PromptCatalog::new();
/// let rendered = render(catalog.get("concise"), "Classes start in August.", "When do classes start?")?;
/// println!("{}", rendered.system);
/// # Ok(())
/// # }
/// ```
pub fn render(template: &PromptTemplate, context: &str, question: &str) -> AppResult<RenderedPrompt> {
    let mut variables = HashMap::new();
    variables.insert("context".to_string(), context.to_string());
    variables.insert("question".to_string(), question.to_string());
    render_with(template, &variables)
}

/// Render a template with an arbitrary variable map.
pub fn render_with(
    template: &PromptTemplate,
    variables: &HashMap<String, String>,
) -> AppResult<RenderedPrompt> {
    tracing::debug!("Rendering prompt: {}", template.name);

    Ok(RenderedPrompt {
        system: render_template(&template.system, variables)?,
        user: render_template(&template.human, variables)?,
        source_prompt: template.name.clone(),
    })
}

/// Render a single Handlebars template string.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

/// Check that a template string parses.
pub fn validate_template(template: &str) -> AppResult<()> {
    let mut handlebars = Handlebars::new();
    handlebars
        .register_template_string("check", template)
        .map_err(|e| AppError::Prompt(format!("Invalid template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_both_messages() {
        let template = PromptTemplate::new(
            "faq",
            "Use this context: {{context}}",
            "Q: {{question}}",
        );

        let rendered = render(&template, "Fees are due in September.", "When are fees due?").unwrap();
        assert_eq!(rendered.system, "Use this context: Fees are due in September.");
        assert_eq!(rendered.user, "Q: When are fees due?");
        assert_eq!(rendered.source_prompt, "faq");
    }

    #[test]
    fn test_render_does_not_escape_html() {
        let template = PromptTemplate::new("faq", "{{context}}", "{{question}}");
        let rendered = render(&template, "<b>Tuition</b> & fees", "what's \"MSIT\"?").unwrap();
        assert_eq!(rendered.system, "<b>Tuition</b> & fees");
        assert_eq!(rendered.user, "what's \"MSIT\"?");
    }

    #[test]
    fn test_render_missing_variable_is_empty() {
        let vars = HashMap::new();
        let result = render_template("History: {{history}}", &vars).unwrap();
        assert_eq!(result, "History: ");
    }

    #[test]
    fn test_validate_template_rejects_unclosed_block() {
        assert!(validate_template("{{#if context}}open").is_err());
        assert!(validate_template("{{context}}").is_ok());
    }
}
