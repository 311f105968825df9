//! Tone-aware prompt construction.
//!
//! Builds the single text blob sent to the provider gateway from the user
//! question, ranked chunks, the conversation memory window, and a selected
//! response tone. Tones are a fixed lookup table of instruction blocks; the
//! composer concatenates them with the output-schema directive, labeled
//! context, and the dialogue transcript, enforcing a character budget.

pub mod composer;
pub mod tone;

pub use composer::{ComposerConfig, PromptComposer, OUTPUT_DIRECTIVE};
pub use tone::Tone;
