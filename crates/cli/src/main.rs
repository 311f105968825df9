//! Mizan CLI
//!
//! Main entry point for the mizan command-line tool.
//! Conversational question answering over the AAOIFI Sharia Standards.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, HistoryCommand};
use mizan_core::{config::EngineConfig, logging, EngineResult};
use std::path::PathBuf;

/// Mizan - conversational answers from the AAOIFI Sharia Standards
#[derive(Parser, Debug)]
#[command(name = "mizan")]
#[command(about = "Conversational Q&A over the AAOIFI Sharia Standards", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "MIZAN_CONFIG")]
    config: Option<PathBuf>,

    /// LLM provider (groq, openai)
    #[arg(short, long, global = true, env = "MIZAN_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "MIZAN_MODEL")]
    model: Option<String>,

    /// Base URL of the chunk store service
    #[arg(long, global = true, env = "MIZAN_CHUNK_STORE_URL")]
    store_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a single question
    Ask(AskCommand),

    /// Interactive conversation session
    Chat(ChatCommand),

    /// Inspect stored conversations
    History(HistoryCommand),
}

#[tokio::main]
async fn main() -> EngineResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let mut config = EngineConfig::load()?;
    if cli.config.is_some() {
        config.config_file = cli.config.clone();
    }

    let config = config.with_overrides(
        cli.provider,
        cli.model,
        cli.store_url,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!(
        provider = %config.provider,
        model = config.model.as_deref().unwrap_or("(provider default)"),
        "Mizan CLI starting"
    );

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::History(_) => "history",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::History(cmd) => cmd.execute(&config).await,
    };

    if let Err(e) = &result {
        tracing::error!("Command failed: {}", e);
    }

    result
}
