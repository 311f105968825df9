//! Prompt composition with context-budget enforcement.

use crate::tone::Tone;
use handlebars::Handlebars;
use mizan_core::{ConversationTurn, EngineError, EngineResult, Role};
use mizan_retrieval::Chunk;
use serde_json::json;

/// Output-schema directive appended to every tone's instruction block.
///
/// Tells the model to emit only the sections relevant to the question and to
/// cite pages with the marker the response parser recognizes.
pub const OUTPUT_DIRECTIVE: &str = "\
Output format:
- Write the answer in markdown. Always begin with the answer itself as prose.
- Cite pages inline with the exact marker [Page N | file] when the source file \
is known, or [Page N] otherwise. Cite each page at most once.
- Only when they genuinely help the question, add sections with these exact \
headers: '### Key Points', '### Requirements', '### Steps', \
'### Important Considerations', '### Key Terms'. No section is mandatory.
- Under '### Key Terms', write one '**Term**: definition' per line.
- If follow-up questions would add value, end with a '### Follow-up Questions' \
section containing 2-4 bullet points. Otherwise omit it.";

const PROMPT_TEMPLATE: &str = "\
{{instructions}}

{{directive}}

{{#if context}}Context from the AAOIFI Sharia Standards:
{{context}}

{{/if}}{{#if transcript}}Previous conversation:
{{transcript}}

{{/if}}Question: {{question}}";

/// Composer limits.
#[derive(Debug, Clone, Copy)]
pub struct ComposerConfig {
    /// Maximum chunks included as context
    pub max_chunks: usize,

    /// Character budget for the whole composed prompt
    pub budget_chars: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_chunks: 5,
            budget_chars: 24_000,
        }
    }
}

/// Builds the final instruction text sent to the provider gateway.
pub struct PromptComposer {
    registry: Handlebars<'static>,
    config: ComposerConfig,
}

impl PromptComposer {
    pub fn new(config: ComposerConfig) -> EngineResult<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string("answer_prompt", PROMPT_TEMPLATE)
            .map_err(|e| EngineError::Other(format!("Invalid prompt template: {}", e)))?;

        Ok(Self { registry, config })
    }

    /// Compose the prompt from the question, ranked chunks, memory window,
    /// and tone.
    ///
    /// Chunks must arrive ranked (descending score, deduplicated); only the
    /// top `max_chunks` are used. When the character budget is exceeded, the
    /// oldest memory pair is dropped first, then the lowest-scoring chunk,
    /// until the prompt fits. Chunks and transcript lines are only ever
    /// dropped whole, never cut mid-sentence.
    pub fn compose(
        &self,
        question: &str,
        chunks: &[Chunk],
        memory_turns: &[ConversationTurn],
        tone: Tone,
    ) -> EngineResult<String> {
        let instructions = tone.instructions();

        let mut context_blocks: Vec<String> = chunks
            .iter()
            .take(self.config.max_chunks)
            .map(format_chunk)
            .collect();
        let mut transcript_lines: Vec<String> =
            memory_turns.iter().map(format_turn).collect();

        // Everything that always survives truncation
        let fixed_len = instructions.len() + OUTPUT_DIRECTIVE.len() + question.len() + 128;

        loop {
            let total = fixed_len
                + context_blocks.iter().map(|b| b.len() + 7).sum::<usize>()
                + transcript_lines.iter().map(|l| l.len() + 1).sum::<usize>();
            if total <= self.config.budget_chars {
                break;
            }

            // Oldest memory pair goes first
            if transcript_lines.len() >= 2 {
                transcript_lines.drain(..2);
                continue;
            }
            if !transcript_lines.is_empty() {
                transcript_lines.clear();
                continue;
            }
            // Then the lowest-scoring chunk (chunks are ranked descending)
            if context_blocks.pop().is_none() {
                tracing::warn!(
                    budget = self.config.budget_chars,
                    "Prompt exceeds budget with no context left to drop"
                );
                break;
            }
        }

        let data = json!({
            "instructions": instructions,
            "directive": OUTPUT_DIRECTIVE,
            "context": context_blocks.join("\n\n---\n\n"),
            "transcript": transcript_lines.join("\n"),
            "question": question,
        });

        self.registry
            .render("answer_prompt", &data)
            .map_err(|e| EngineError::Other(format!("Prompt rendering failed: {}", e)))
    }
}

/// Label a chunk with its citation coordinates.
fn format_chunk(chunk: &Chunk) -> String {
    format!(
        "[Page {} | {}]\n{}",
        chunk.page,
        chunk.source_file,
        chunk.text.trim()
    )
}

/// Render a memory turn as a transcript line.
fn format_turn(turn: &ConversationTurn) -> String {
    let speaker = match turn.role {
        Role::User => "User",
        Role::Assistant => "Assistant",
    };
    format!("{}: {}", speaker, turn.content)
}
