//! History command handler.
//!
//! Lists, shows, and deletes conversations in the configured SQLite store.

use clap::{Args, Subcommand};
use mizan_core::{config::EngineConfig, EngineError, EngineResult};

/// Inspect stored conversations
#[derive(Args, Debug)]
pub struct HistoryCommand {
    #[command(subcommand)]
    action: HistoryAction,
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List stored conversations, most recent first
    List {
        /// Maximum conversations to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show all messages of one conversation
    Show {
        /// Conversation id
        id: String,
    },

    /// Delete a conversation and its messages
    Delete {
        /// Conversation id
        id: String,
    },
}

impl HistoryCommand {
    pub async fn execute(&self, config: &EngineConfig) -> EngineResult<()> {
        let history = super::open_history(config)?.ok_or_else(|| {
            EngineError::Config(
                "No history database configured (set MIZAN_HISTORY_DB)".to_string(),
            )
        })?;

        match &self.action {
            HistoryAction::List { limit } => {
                let summaries = history.list(*limit, 0)?;
                if summaries.is_empty() {
                    println!("No stored conversations.");
                    return Ok(());
                }
                for summary in summaries {
                    println!(
                        "{}  {:>3} messages  {}  {}",
                        summary.id, summary.message_count, summary.updated_at, summary.title
                    );
                }
            }
            HistoryAction::Show { id } => {
                let Some(messages) = history.messages(id)? else {
                    println!("Unknown conversation: {}", id);
                    return Ok(());
                };
                for message in messages {
                    println!("[{}] {}:\n{}\n", message.timestamp, message.role, message.content);
                }
            }
            HistoryAction::Delete { id } => {
                if history.delete(id)? {
                    println!("Deleted {}", id);
                } else {
                    println!("Unknown conversation: {}", id);
                }
            }
        }
        Ok(())
    }
}
