//! Info command handler.

use super::{print_json, setup_bot};
use clap::Args;
use faqbot_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// Show prompts, chains and store status
#[derive(Args, Debug)]
pub struct InfoCommand {
    /// Store directory (default: store.path from config)
    #[arg(long)]
    pub store: Option<PathBuf>,
}

impl InfoCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let (bot, store_path) = setup_bot(config, self.store.as_deref())?;

        print_json(&serde_json::json!({
            "store": store_path,
            "provider": config.llm.provider,
            "model": config.llm.model,
            "embedding": config.embedding.provider,
            "webSearchConfigured": config.search.api_key.is_some(),
            "system": bot.system_info(),
        }))
    }
}
