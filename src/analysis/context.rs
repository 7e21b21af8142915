//! # Input Preparation and Context Folding
//!
//! Lexical gates over the input text and the conditional folding of recent
//! history into short ambiguous messages. Folding trades precision for
//! recall deliberately: long inputs carry their own signal and stay
//! untouched, while a short emotional fragment borrows recent emotional
//! context to disambiguate.

use crate::constants::lexicon::{EMOTIONAL_KEYWORDS, QUESTION_TOKENS};

/// Whitespace-delimited token count
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn contains_any(lowered: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| lowered.contains(needle))
}

/// Whether the text mentions an emotionally salient keyword.
/// Expects lowercased input; matching is substring-based.
pub fn has_emotional_cue(lowered: &str) -> bool {
    contains_any(lowered, EMOTIONAL_KEYWORDS)
}

/// Whether the text reads as a question by the fixed interrogative cues.
/// Expects lowercased input; matching is substring-based.
pub fn has_question_cue(lowered: &str) -> bool {
    contains_any(lowered, QUESTION_TOKENS)
}

/// Canonical input form scored by the backends: trimmed and lowercased
pub fn normalize_input(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Fold recent history into a short emotional input.
///
/// Returns the folded text only when every gate passes: the input is short
/// (fewer than `short_token_limit` tokens), it carries an emotional keyword
/// itself, and at least one history entry does too. Only the emotionally
/// relevant entries are folded in.
pub fn fold_short_input_context(
    normalized_text: &str,
    history: &[String],
    short_token_limit: usize,
) -> Option<String> {
    if token_count(normalized_text) >= short_token_limit || history.is_empty() {
        return None;
    }
    if !has_emotional_cue(normalized_text) {
        return None;
    }

    let relevant: Vec<&str> = history
        .iter()
        .filter(|entry| has_emotional_cue(&entry.to_lowercase()))
        .map(String::as_str)
        .collect();
    if relevant.is_empty() {
        return None;
    }

    Some(format!(
        "Conversation context: {} Current message: {}",
        relevant.join(" "),
        normalized_text
    ))
}
