//! Best-effort decoding of raw model output into a structured answer.
//!
//! Model output is markdown annotated with conventions: `[Page N | file]`
//! citation markers, optional `### ` headed sections, and a delimited
//! trailing follow-up block. The decode is lossy-tolerant by contract:
//! each extractor is independent, anything unrecognized stays in
//! `main_text`, and the only hard failure is empty input.

use crate::types::{Citation, KeyTerm, StructuredAnswer};
use mizan_core::{EngineError, EngineResult};
use regex::Regex;
use std::sync::OnceLock;

fn citation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\[page\s+(\d+)(?:\s*\|\s*([^\]\n]+?))?\s*\]")
            .expect("citation pattern is valid")
    })
}

/// Parse raw model output into a [`StructuredAnswer`].
///
/// # Errors
/// `EngineError::EmptyInput` when the input is empty or whitespace, the one
/// hard failure mode.
pub fn parse_answer(raw: &str) -> EngineResult<StructuredAnswer> {
    if raw.trim().is_empty() {
        return Err(EngineError::EmptyInput);
    }

    let citations = extract_citations(raw);
    let (body, follow_up_questions) = split_follow_ups(raw);
    let mut answer = split_sections(&body);

    answer.citations = citations;
    answer.follow_up_questions = follow_up_questions;
    Ok(answer)
}

/// Scan for page-citation markers, deduplicating by `(page, source_file)`
/// while preserving first-seen order.
fn extract_citations(text: &str) -> Vec<Citation> {
    let mut citations: Vec<Citation> = Vec::new();
    for caps in citation_regex().captures_iter(text) {
        let Some(page) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        let source_file = caps.get(2).map(|m| m.as_str().trim().to_string());
        let citation = Citation { page, source_file };
        if !citations.contains(&citation) {
            citations.push(citation);
        }
    }
    citations
}

/// Split off the clearly delimited trailing follow-up section, if any.
fn split_follow_ups(text: &str) -> (String, Vec<String>) {
    let delimiter = text.lines().rev().find(|line| is_follow_up_header(line));
    let Some(delimiter) = delimiter else {
        return (text.to_string(), Vec::new());
    };

    // rfind: follow-ups are a trailing section; an earlier mention of the
    // phrase inside prose must not split the answer.
    let Some(at) = text.rfind(delimiter) else {
        return (text.to_string(), Vec::new());
    };

    let body = text[..at].to_string();
    let tail = &text[at + delimiter.len()..];
    let questions: Vec<String> = tail
        .lines()
        .filter_map(strip_list_marker)
        .filter(|q| !q.is_empty())
        .collect();

    if questions.is_empty() {
        // Delimiter with no questions under it: keep the text intact
        return (text.to_string(), Vec::new());
    }
    (body, questions)
}

fn is_follow_up_header(line: &str) -> bool {
    let lowered = line.trim().trim_start_matches('#').trim().to_lowercase();
    lowered.starts_with("follow-up questions")
        || lowered.starts_with("related questions")
        || lowered.starts_with("**related questions")
}

#[derive(Clone, Copy, PartialEq)]
enum SectionKind {
    KeyPoints,
    Requirements,
    Steps,
    Considerations,
    KeyTerms,
}

fn classify_header(line: &str) -> Option<SectionKind> {
    let trimmed = line.trim();
    if !trimmed.starts_with('#') {
        return None;
    }
    let title = trimmed.trim_start_matches('#').trim().to_lowercase();
    match title.as_str() {
        "key points" => Some(SectionKind::KeyPoints),
        "requirements" => Some(SectionKind::Requirements),
        "steps" | "implementation steps" => Some(SectionKind::Steps),
        "important considerations" | "considerations" => Some(SectionKind::Considerations),
        "key terms" => Some(SectionKind::KeyTerms),
        _ => None,
    }
}

/// Separate recognized `### ` sections from the main answer text. Content
/// under unrecognized headers stays in `main_text`.
fn split_sections(body: &str) -> StructuredAnswer {
    let mut answer = StructuredAnswer::default();
    let mut main_lines: Vec<&str> = Vec::new();
    let mut current: Option<SectionKind> = None;

    for line in body.lines() {
        if let Some(kind) = classify_header(line) {
            current = Some(kind);
            continue;
        }
        if line.trim().starts_with('#') {
            // Unrecognized header: back to main text
            current = None;
            main_lines.push(line);
            continue;
        }

        match current {
            None => main_lines.push(line),
            Some(kind) => {
                let Some(item) = strip_list_marker(line) else {
                    continue;
                };
                if item.is_empty() {
                    continue;
                }
                match kind {
                    SectionKind::KeyPoints => answer.key_points.push(item),
                    SectionKind::Requirements => answer.requirements.push(item),
                    SectionKind::Steps => answer.steps.push(item),
                    SectionKind::Considerations => answer.considerations.push(item),
                    SectionKind::KeyTerms => {
                        if let Some(term) = parse_key_term(&item) {
                            answer.key_terms.push(term);
                        }
                    }
                }
            }
        }
    }

    answer.main_text = main_lines.join("\n").trim().to_string();
    answer
}

/// Strip a leading bullet or numbered-list marker; returns the trimmed rest.
fn strip_list_marker(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Some(String::new());
    }
    for marker in ["- ", "* ", "• "] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return Some(rest.trim().to_string());
        }
    }
    // Numbered item: "1. text" or "2) text"
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return Some(rest.trim().to_string());
        }
    }
    Some(trimmed.to_string())
}

/// Parse a `**Term**: definition` (or `Term: definition`) line.
fn parse_key_term(item: &str) -> Option<KeyTerm> {
    if let Some(rest) = item.strip_prefix("**") {
        if let Some((term, def)) = rest.split_once("**") {
            let definition = def.trim_start_matches(':').trim();
            if !term.trim().is_empty() && !definition.is_empty() {
                return Some(KeyTerm {
                    term: term.trim().to_string(),
                    definition: definition.to_string(),
                });
            }
        }
    }
    let (term, def) = item.split_once(':')?;
    let term = term.trim();
    let def = def.trim();
    if term.is_empty() || def.is_empty() {
        return None;
    }
    Some(KeyTerm {
        term: term.to_string(),
        definition: def.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(parse_answer(""), Err(EngineError::EmptyInput)));
        assert!(matches!(parse_answer("  \n\t"), Err(EngineError::EmptyInput)));
    }

    #[test]
    fn test_plain_text_collapses_to_main_text() {
        let answer = parse_answer("just plain text, no markers").unwrap();
        assert_eq!(answer.main_text, "just plain text, no markers");
        assert!(answer.key_points.is_empty());
        assert!(answer.citations.is_empty());
        assert!(answer.follow_up_questions.is_empty());
    }

    #[test]
    fn test_citations_deduplicated_first_seen() {
        let raw = "A rule [Page 3]. Another [Page 7 | standards.pdf]. Again [Page 3]. \
                   And [Page 7 | standards.pdf] once more.";
        let answer = parse_answer(raw).unwrap();
        assert_eq!(answer.citations.len(), 2);
        assert_eq!(answer.citations[0].page, 3);
        assert_eq!(answer.citations[0].source_file, None);
        assert_eq!(answer.citations[1].page, 7);
        assert_eq!(
            answer.citations[1].source_file.as_deref(),
            Some("standards.pdf")
        );
    }

    #[test]
    fn test_same_page_different_file_kept_separately() {
        let raw = "[Page 3 | a.pdf] and [Page 3 | b.pdf] and [Page 3]";
        let answer = parse_answer(raw).unwrap();
        assert_eq!(answer.citations.len(), 3);
    }

    #[test]
    fn test_n_distinct_markers_yield_n_citations() {
        let raw = "[Page 1] x [Page 2] y [Page 3] z [Page 2] [Page 1]";
        let answer = parse_answer(raw).unwrap();
        let pages: Vec<u32> = answer.citations.iter().map(|c| c.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[test]
    fn test_structured_output() {
        let raw = "\
Murabaha requires the bank to own the asset first [Page 12 | standards.pdf].

### Key Points
- Ownership precedes sale
- Price markup must be disclosed

### Requirements
- A binding promise is not a sale [Page 14]

### Steps
1. Acquire the asset
2. Disclose cost and markup

### Key Terms
**Murabaha**: cost-plus sale

### Follow-up Questions
- What if the client defaults?
- Can the markup change?";

        let answer = parse_answer(raw).unwrap();
        assert!(answer.main_text.starts_with("Murabaha requires"));
        assert!(!answer.main_text.contains("Key Points"));
        assert_eq!(answer.key_points.len(), 2);
        assert_eq!(answer.requirements, vec!["A binding promise is not a sale [Page 14]"]);
        assert_eq!(answer.steps, vec!["Acquire the asset", "Disclose cost and markup"]);
        assert_eq!(answer.key_terms.len(), 1);
        assert_eq!(answer.key_terms[0].term, "Murabaha");
        assert_eq!(answer.key_terms[0].definition, "cost-plus sale");
        assert_eq!(answer.citations.len(), 2);
        assert_eq!(
            answer.follow_up_questions,
            vec!["What if the client defaults?", "Can the markup change?"]
        );
    }

    #[test]
    fn test_related_questions_delimiter() {
        let raw = "The answer.\n\n**Related questions you might ask:**\n- One?\n- Two?";
        let answer = parse_answer(raw).unwrap();
        assert_eq!(answer.main_text, "The answer.");
        assert_eq!(answer.follow_up_questions, vec!["One?", "Two?"]);
    }

    #[test]
    fn test_unrecognized_header_stays_in_main_text() {
        let raw = "Intro.\n\n### Historical Background\nSome history here.";
        let answer = parse_answer(raw).unwrap();
        assert!(answer.main_text.contains("### Historical Background"));
        assert!(answer.main_text.contains("Some history here."));
    }

    #[test]
    fn test_follow_up_header_without_questions_is_harmless() {
        let raw = "Answer text.\n\n### Follow-up Questions";
        let answer = parse_answer(raw).unwrap();
        assert!(answer.main_text.contains("Answer text."));
        assert!(answer.follow_up_questions.is_empty());
    }

    #[test]
    fn test_malformed_page_marker_ignored() {
        let raw = "See [Page abc] and [Page 5].";
        let answer = parse_answer(raw).unwrap();
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].page, 5);
    }
}
