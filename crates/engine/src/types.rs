//! Engine API types: requests, structured answers, memory statistics.

use mizan_core::config::MemorySettings;
use mizan_prompt::Tone;
use mizan_retrieval::Chunk;
use serde::{Deserialize, Serialize};

/// A page citation extracted from the model's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Page number in the source document
    pub page: u32,

    /// Source document filename, when the marker carried one
    #[serde(rename = "sourceFile", skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

/// A defined term from a '### Key Terms' section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTerm {
    pub term: String,
    pub definition: String,
}

/// Structured answer decoded from raw model output.
///
/// Only `main_text` is guaranteed; every other field is present only when the
/// question warranted it. Presence is determined by question complexity, not
/// by tone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredAnswer {
    /// The answer prose; never empty
    #[serde(rename = "mainText")]
    pub main_text: String,

    #[serde(rename = "keyPoints", default, skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub considerations: Vec<String>,

    #[serde(rename = "keyTerms", default, skip_serializing_if = "Vec::is_empty")]
    pub key_terms: Vec<KeyTerm>,

    /// Page citations in first-seen order, deduplicated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,

    #[serde(
        rename = "followUpQuestions",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub follow_up_questions: Vec<String>,
}

impl StructuredAnswer {
    /// Render the answer back to presentable markdown.
    ///
    /// Sections appear only when populated, followed by a reference line and
    /// the follow-up block.
    pub fn to_markdown(&self) -> String {
        let mut out = Vec::new();
        out.push(self.main_text.clone());

        push_section(&mut out, "### Key Points", &self.key_points, "- ");
        push_section(&mut out, "### Requirements", &self.requirements, "- ");

        if !self.steps.is_empty() {
            out.push(String::new());
            out.push("### Steps".to_string());
            for (i, step) in self.steps.iter().enumerate() {
                out.push(format!("{}. {}", i + 1, step));
            }
        }

        push_section(
            &mut out,
            "### Important Considerations",
            &self.considerations,
            "- ",
        );

        if !self.key_terms.is_empty() {
            out.push(String::new());
            out.push("### Key Terms".to_string());
            for kt in &self.key_terms {
                out.push(format!("**{}**: {}", kt.term, kt.definition));
            }
        }

        if !self.citations.is_empty() {
            let refs: Vec<String> = self
                .citations
                .iter()
                .map(|c| format!("Page {}", c.page))
                .collect();
            out.push(String::new());
            out.push(format!("*References: {}*", refs.join(", ")));
        }

        if !self.follow_up_questions.is_empty() {
            out.push(String::new());
            out.push("**Related questions you might ask:**".to_string());
            for q in &self.follow_up_questions {
                out.push(format!("- {}", q));
            }
        }

        out.join("\n")
    }
}

fn push_section(out: &mut Vec<String>, header: &str, items: &[String], bullet: &str) {
    if items.is_empty() {
        return;
    }
    out.push(String::new());
    out.push(header.to_string());
    for item in items {
        out.push(format!("{}{}", bullet, item));
    }
}

/// One answer request into the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    /// Existing conversation to continue; a fresh id is minted when absent
    #[serde(rename = "conversationId", skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// The user's question
    pub message: String,

    /// Response tone
    #[serde(default)]
    pub tone: Tone,

    /// Optional memory settings applied before processing
    #[serde(rename = "memorySettings", skip_serializing_if = "Option::is_none")]
    pub memory_settings: Option<MemorySettings>,
}

impl AnswerRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            conversation_id: None,
            message: message.into(),
            tone: Tone::default(),
            memory_settings: None,
        }
    }

    pub fn with_conversation(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }
}

/// Engine response: the structured answer plus the sources that backed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    #[serde(rename = "conversationId")]
    pub conversation_id: String,

    pub answer: StructuredAnswer,

    /// Chunks used as context, ranked; empty when retrieval degraded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Chunk>,
}

/// Snapshot of a conversation's memory state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MemoryStats {
    pub enabled: bool,

    #[serde(rename = "windowSize")]
    pub window_size: usize,

    #[serde(rename = "pairCount")]
    pub pair_count: usize,

    #[serde(rename = "atCapacity")]
    pub at_capacity: bool,
}
