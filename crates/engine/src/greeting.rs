//! Greeting detection and the canned greeting response.
//!
//! Simple greetings skip the retrieve/generate pipeline entirely; the
//! response is fixed and costs nothing.

use crate::types::StructuredAnswer;

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
    "good day",
    "howdy",
    "hiya",
    "yo",
    "sup",
    "what's up",
    "whats up",
    "how are you",
    "how do you do",
    "salaam",
    "salam",
    "assalamu alaikum",
    "peace be upon you",
];

/// Phrases safe to match inside a longer message. "salam"/"salaam" are
/// deliberately absent: Salam is a contract type in the standards, so those
/// only count as whole-message greetings.
const CONTAINED_GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
    "good day",
    "howdy",
    "hiya",
    "what's up",
    "whats up",
    "how are you",
    "how do you do",
    "assalamu alaikum",
    "peace be upon you",
];

/// Whether the message is a simple greeting rather than a question.
///
/// An exact match against the greeting set counts, as does a message of at
/// most four words containing an unambiguous greeting phrase on word
/// boundaries.
pub fn is_greeting(message: &str) -> bool {
    let normalized = message
        .to_lowercase()
        .trim()
        .trim_end_matches(['!', '?', '.', ','])
        .trim()
        .to_string();

    if GREETINGS.contains(&normalized.as_str()) {
        return true;
    }
    if normalized.split_whitespace().count() <= 4 {
        // Word-boundary match so "hi" never fires inside "this"
        let padded = format!(" {} ", normalized);
        return CONTAINED_GREETINGS
            .iter()
            .any(|g| padded.contains(&format!(" {} ", g)));
    }
    false
}

/// The fixed greeting answer, with follow-ups steering toward the corpus.
pub fn greeting_answer() -> StructuredAnswer {
    StructuredAnswer {
        main_text: "Hello! Welcome to the AAOIFI Standards assistant.\n\n\
            I can help you with questions about the AAOIFI Sharia Standards \
            for Islamic financial institutions:\n\n\
            - Understanding Islamic banking principles\n\
            - Explaining Sharia compliance requirements\n\
            - Clarifying specific standards and guidelines\n\
            - Interpreting rules for financial contracts\n\n\
            How can I assist you today?"
            .to_string(),
        follow_up_questions: vec![
            "What are the key principles of Islamic banking?".to_string(),
            "Explain the requirements for Sharia compliance".to_string(),
            "What are the different types of Islamic financial contracts?".to_string(),
            "Tell me about Murabaha transactions".to_string(),
        ],
        ..Default::default()
    }
}
