//! Ask command handler.

use super::{print_json, setup_bot};
use clap::Args;
use faqbot_core::{config::AppConfig, AppError, AppResult};
use faqbot_knowledge::rag::CONVERSATIONAL;
use faqbot_knowledge::{AskOutcome, ChainFlavor};
use std::path::PathBuf;

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Chain flavor to answer with (conversational, retrieval)
    #[arg(long)]
    pub chain: Option<String>,

    /// Store directory (default: store.path from config)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let (bot, _) = setup_bot(config, self.store.as_deref())?;

        let chain = match self.chain.as_deref() {
            None | Some(CONVERSATIONAL) => None,
            Some(name) => {
                let flavor = ChainFlavor::parse(name).ok_or_else(|| {
                    AppError::Config(format!(
                        "Unknown chain: '{}'. Supported chains: conversational, retrieval",
                        name
                    ))
                })?;
                if bot.system_info().vectorstore_loaded {
                    bot.register_chain(name, flavor, &config.bot.prompt)?;
                }
                Some(name)
            }
        };

        let outcome = bot.ask(&self.question, chain).await;

        if self.json {
            print_json(&outcome)
        } else {
            print_outcome(&outcome);
            Ok(())
        }
    }
}

/// Print the answer text followed by its sources.
pub(crate) fn print_outcome(outcome: &AskOutcome) {
    println!("{}", outcome.answer_text());

    let sources = outcome.sources();
    if sources.is_empty() {
        return;
    }

    if outcome.fallback_used() {
        println!("\n(answered from web search)");
    }

    println!("\nSources:");
    for source in sources {
        match source.score {
            Some(score) => println!("  - {} [{}] ({:.3})", source.source, source.source_type, score),
            None => println!("  - {} [{}]", source.source, source.source_type),
        }
    }
}
