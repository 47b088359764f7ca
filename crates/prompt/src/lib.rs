//! Prompt catalog for the FAQ assistant.
//!
//! This crate provides:
//! - Built-in `strict` and `concise` templates
//! - Runtime registration of custom templates
//! - YAML-based custom template loading
//! - Handlebars rendering of `{{context}}` and `{{question}}` slots

pub mod builder;
pub mod catalog;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{render, render_template, render_with};
pub use catalog::{PromptCatalog, CONCISE, STRICT};
pub use loader::{load_custom_prompts, load_prompt_file};
pub use types::{PromptTemplate, RenderedPrompt, DEFAULT_HUMAN_TEMPLATE};
