//! FAQ assistant CLI
//!
//! Main entry point for the faqbot command-line tool: ingest sources into
//! the vector store, then ask questions once or in an interactive chat.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, InfoCommand, IngestCommand};
use faqbot_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// University FAQ assistant with retrieval and web search fallback
#[derive(Parser, Debug)]
#[command(name = "faqbot")]
#[command(about = "University FAQ assistant with retrieval and web search fallback", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "FAQBOT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "FAQBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (ollama, openai)
    #[arg(short, long, global = true, env = "FAQBOT_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "FAQBOT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the listed sources and build the vector store
    Ingest(IngestCommand),

    /// Answer a single question
    Ask(AskCommand),

    /// Interactive question session with conversation memory
    Chat(ChatCommand),

    /// Show prompts, chains and store status
    Info(InfoCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // API keys may live in a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace, cli.config)?.with_overrides(
        None,
        None,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_format)?;

    tracing::info!("faqbot starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} ({})", config.llm.provider, config.llm.model);

    config.validate()?;
    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Info(_) => "info",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Info(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
