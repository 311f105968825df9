//! Ask command handler.
//!
//! One-shot question answering: retrieve, generate, print.

use clap::Args;
use mizan_core::{config::EngineConfig, EngineError, EngineResult};
use mizan_engine::AnswerRequest;
use mizan_prompt::Tone;

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Response tone (conversational, concise, detailed, professional, simple)
    #[arg(short, long, default_value = "conversational")]
    pub tone: String,

    /// Continue an existing conversation
    #[arg(long)]
    pub conversation: Option<String>,

    /// Output the structured answer as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &EngineConfig) -> EngineResult<()> {
        let question = self
            .question
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| EngineError::Config("No question provided".to_string()))?;

        let tone = Tone::parse(&self.tone)
            .ok_or_else(|| EngineError::Config(format!("Unknown tone: {}", self.tone)))?;

        let engine = super::build_engine(config)?;

        let mut request = AnswerRequest::new(question).with_tone(tone);
        if let Some(id) = &self.conversation {
            request = request.with_conversation(id);
        }

        let response = engine.answer(request).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
            return Ok(());
        }

        println!("{}", response.answer.to_markdown());
        if !response.sources.is_empty() {
            tracing::info!(sources = response.sources.len(), "Answer grounded in retrieved context");
        }
        tracing::info!(conversation = %response.conversation_id, "Conversation id");

        Ok(())
    }
}
