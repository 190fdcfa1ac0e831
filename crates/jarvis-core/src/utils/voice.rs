//! Shaping replies for speech

use regex::Regex;
use std::sync::LazyLock;

static FAREWELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:ok(?:ay)?\s+)?(?:stop|goodbye|good\s*bye|bye(?:\s*bye)?|cancel|that'?s\s+all)(?:\s+(?:jarvis|now|please|thanks?|thank\s+you))*$")
        .expect("FAREWELL is a compile-time constant")
});

/// Whether an utterance asks to end the session ("stop", "goodbye", ...)
#[must_use]
pub fn is_farewell(utterance: &str) -> bool {
    let normalized: String = utterance
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | '!' | '?' | ','))
        .collect();
    FAREWELL.is_match(normalized.trim())
}

/// Shorten `text` to at most `max_chars` characters for speaking.
///
/// Cuts at the last sentence end (`.`, `?`, `!`) found past the halfway
/// point; otherwise cuts hard and appends `...`.
#[must_use]
pub fn truncate_for_voice(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(i, _)| i);
    let head = &text[..cut];

    let boundary = head
        .char_indices()
        .filter(|(_, c)| matches!(c, '.' | '?' | '!'))
        .map(|(i, _)| i)
        .last();

    match boundary {
        Some(i) if head[..i].chars().count() > max_chars / 2 => text[..=i].to_string(),
        _ => format!("{head}..."),
    }
}
