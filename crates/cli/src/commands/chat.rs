//! Interactive chat command handler.

use super::{ask::print_outcome, print_json, setup_bot};
use clap::Args;
use faqbot_core::{config::AppConfig, AppResult};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive question session with conversation memory
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Store directory (default: store.path from config)
    #[arg(long)]
    pub store: Option<PathBuf>,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let (bot, _) = setup_bot(config, self.store.as_deref())?;

        println!("Ask a question. Commands: /clear, /info, /exit");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match line.trim() {
                "" => continue,
                "/exit" | "/quit" => break,
                "/clear" => {
                    bot.clear_memory();
                    println!("Conversation memory cleared.");
                }
                "/info" => print_json(&bot.system_info())?,
                question => {
                    let outcome = bot.ask(question, None).await;
                    print_outcome(&outcome);
                    println!();
                }
            }
        }

        tracing::info!("Chat session ended");
        Ok(())
    }
}
