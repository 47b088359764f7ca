//! Command handlers for the faqbot CLI.

pub mod ask;
pub mod chat;
pub mod info;
pub mod ingest;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use info::InfoCommand;
pub use ingest::IngestCommand;

use faqbot_core::{config::AppConfig, AppResult};
use faqbot_knowledge::Bot;
use std::path::{Path, PathBuf};

/// Build the bot and load the store, warning when no store is usable.
pub(crate) fn setup_bot(config: &AppConfig, store: Option<&Path>) -> AppResult<(Bot, PathBuf)> {
    let bot = Bot::from_config(config)?;
    let store_path = store
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.store_path());

    if !bot.setup(&store_path, &config.bot.memory_type) {
        tracing::warn!(
            "No usable vector store at {:?}; run `faqbot ingest` first",
            store_path
        );
    }

    Ok((bot, store_path))
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
