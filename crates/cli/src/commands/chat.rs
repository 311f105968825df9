//! Chat command handler.
//!
//! Interactive session on stdin. The conversation id is minted on the first
//! answer and reused for every following turn, so the memory window builds
//! up across the session.

use clap::Args;
use mizan_core::{config::EngineConfig, EngineError, EngineResult};
use mizan_engine::AnswerRequest;
use mizan_prompt::Tone;
use std::io::{BufRead, Write};

/// Interactive conversation session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Response tone to start with
    #[arg(short, long, default_value = "conversational")]
    pub tone: String,

    /// Resume an existing conversation
    #[arg(long)]
    pub conversation: Option<String>,
}

impl ChatCommand {
    pub async fn execute(&self, config: &EngineConfig) -> EngineResult<()> {
        let mut tone = Tone::parse(&self.tone)
            .ok_or_else(|| EngineError::Config(format!("Unknown tone: {}", self.tone)))?;

        let engine = super::build_engine(config)?;
        let mut conversation_id = self.conversation.clone();

        println!("Mizan chat. Ask about the AAOIFI Sharia Standards.");
        println!("Commands: /tone <name>, /stats, /clear, /quit");

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("> ");
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break; // EOF
            }
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            if let Some(command) = input.strip_prefix('/') {
                match self.handle_command(command, &engine, &conversation_id, &mut tone) {
                    CommandOutcome::Continue => continue,
                    CommandOutcome::Quit => break,
                }
            }

            let mut request = AnswerRequest::new(input).with_tone(tone);
            if let Some(id) = &conversation_id {
                request = request.with_conversation(id.clone());
            }

            match engine.answer(request).await {
                Ok(response) => {
                    conversation_id = Some(response.conversation_id.clone());
                    println!("\n{}\n", response.answer.to_markdown());
                }
                Err(err) => {
                    eprintln!("error: {}", err);
                }
            }
        }

        Ok(())
    }

    fn handle_command(
        &self,
        command: &str,
        engine: &mizan_engine::AnswerEngine,
        conversation_id: &Option<String>,
        tone: &mut Tone,
    ) -> CommandOutcome {
        let mut parts = command.split_whitespace();
        match parts.next() {
            Some("quit") | Some("exit") => return CommandOutcome::Quit,
            Some("tone") => match parts.next().and_then(Tone::parse) {
                Some(parsed) => {
                    *tone = parsed;
                    println!("Tone set to {}", tone.as_str());
                }
                None => println!(
                    "Usage: /tone <conversational|concise|detailed|professional|simple>"
                ),
            },
            Some("clear") => {
                if let Some(id) = conversation_id {
                    engine.clear_memory(id);
                    println!("Memory cleared.");
                } else {
                    println!("No conversation yet.");
                }
            }
            Some("stats") => {
                if let Some(id) = conversation_id {
                    let stats = engine.memory_stats(id);
                    println!(
                        "memory enabled: {}, window: {} pairs, held: {} pairs, at capacity: {}",
                        stats.enabled, stats.window_size, stats.pair_count, stats.at_capacity
                    );
                } else {
                    println!("No conversation yet.");
                }
            }
            _ => println!("Unknown command: /{}", command),
        }
        CommandOutcome::Continue
    }
}

enum CommandOutcome {
    Continue,
    Quit,
}
