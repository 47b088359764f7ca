//! Generation settings bound to a provider.

use faqbot_core::AppResult;
use faqbot_llm::{generate_text, LlmClient, LlmRequest};
use faqbot_prompt::RenderedPrompt;
use std::sync::Arc;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// A provider plus the model settings every call uses.
#[derive(Clone)]
pub struct Generator {
    llm: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    streaming: bool,
}

impl Generator {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            streaming: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Drain the provider's token stream instead of a single completion.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.llm.provider_name()
    }

    /// Generate the complete text for a prompt.
    pub async fn generate(&self, system: Option<&str>, prompt: &str) -> AppResult<String> {
        let mut request = LlmRequest::new(prompt, &self.model)
            .with_temperature(self.temperature)
            .with_streaming(self.streaming);
        if let Some(system) = system {
            request = request.with_system(system);
        }

        generate_text(self.llm.as_ref(), &request).await
    }

    /// Generate from a rendered system/user prompt pair.
    pub async fn generate_rendered(&self, prompt: &RenderedPrompt) -> AppResult<String> {
        self.generate(Some(&prompt.system), &prompt.user).await
    }
}
