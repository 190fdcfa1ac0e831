//! Pattern-based extraction, no LLM calls.
//!
//! Recognises a handful of first-person statements in what the user said.
//! Used offline and whenever the configured provider is the mock.

use super::candidate::{Candidate, CandidateFact, CandidatePreference, Transcript};
use super::FactExtractor;
use crate::error::Result;
use async_trait::async_trait;
use jarvis_memory::{FactCategory, Importance};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

// ── Compiled patterns ───────────────────────────────────────────

static RE_SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?;\n]+").expect("RE_SENTENCE is a compile-time constant"));

static RE_RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bmy\s+(son|daughter|wife|husband|mother|mom|mum|father|dad|brother|sister|grandson|granddaughter|grandmother|grandma|grandfather|grandpa|kids|children|baby)\s+(loves|likes|hates|dislikes|enjoys|is allergic to|can't eat|cannot eat)\s+(.+)",
    )
    .expect("RE_RELATIVE is a compile-time constant")
});

static RE_ALLERGY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bi(?:'m|\s+am)\s+allergic\s+to\s+(.+)")
        .expect("RE_ALLERGY is a compile-time constant")
});

static RE_MEDICINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bi\s+take\s+(.+?)\s+(every\s+\w+|daily|twice\s+a\s+day|at\s+night|in\s+the\s+morning|after\s+\w+)")
        .expect("RE_MEDICINE is a compile-time constant")
});

static RE_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bi\s+(really\s+)?(love|like|enjoy|hate|dislike|prefer)\s+(.+)")
        .expect("RE_LIKE is a compile-time constant")
});

static RE_FAVOURITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bmy\s+favou?rite\s+([a-z]+(?:\s+[a-z]+)?)\s+is\s+(.+)")
        .expect("RE_FAVOURITE is a compile-time constant")
});

static RE_DIET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bi(?:'m|\s+am)\s+(?:a\s+)?(vegetarian|vegan|eggetarian|jain|diabetic)\b")
        .expect("RE_DIET is a compile-time constant")
});

static RE_CALL_ME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bcall\s+me\s+([a-z][a-z'\-]*)")
        .expect("RE_CALL_ME is a compile-time constant")
});

/// Words that mark a favourite or a liking as food related
static FOOD_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "food", "dish", "snack", "dessert", "sweet", "fruit", "drink", "tea", "coffee", "cake",
        "chocolate", "biryani", "dosa", "idli", "paneer", "curry", "rice", "roti", "dal",
        "ice cream", "pizza", "pasta", "breakfast", "lunch", "dinner", "juice", "milk",
    ]
    .into_iter()
    .collect()
});

/// Rule-based extractor
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    /// Create a new rule-based extractor
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract candidates from one user sentence
    fn sentence(&self, sentence: &str, out: &mut Vec<Candidate>) {
        if let Some(cap) = RE_RELATIVE.captures(sentence) {
            let relation = cap[1].to_lowercase();
            let verb = cap[2].to_lowercase();
            let object = clean_object(&cap[3]);
            if !object.is_empty() {
                let (category, importance) = if verb.contains("allergic") || verb.contains("eat") {
                    (FactCategory::Health, Importance::Critical)
                } else {
                    (FactCategory::Family, Importance::Normal)
                };
                out.push(fact(format!("{relation} {verb} {object}"), category, importance));
            }
            return;
        }

        if let Some(cap) = RE_ALLERGY.captures(sentence) {
            let object = clean_object(&cap[1]);
            if !object.is_empty() {
                out.push(fact(
                    format!("allergic to {object}"),
                    FactCategory::Health,
                    Importance::Critical,
                ));
            }
            return;
        }

        if let Some(cap) = RE_MEDICINE.captures(sentence) {
            let medicine = clean_object(&cap[1]);
            let schedule = cap[2].to_lowercase();
            out.push(fact(
                format!("takes {medicine} {schedule}"),
                FactCategory::Health,
                Importance::High,
            ));
            return;
        }

        if let Some(cap) = RE_FAVOURITE.captures(sentence) {
            let subject = cap[1].to_lowercase();
            let value = clean_object(&cap[2]);
            if !value.is_empty() {
                out.push(Candidate::Preference(CandidatePreference {
                    category: preference_category(&subject).to_string(),
                    key: format!("favourite_{}", subject.replace(' ', "_")),
                    value,
                    confidence: 0.9,
                }));
            }
            return;
        }

        if let Some(cap) = RE_DIET.captures(sentence) {
            out.push(Candidate::Preference(CandidatePreference {
                category: "food".to_string(),
                key: "diet".to_string(),
                value: cap[1].to_lowercase(),
                confidence: 0.9,
            }));
            return;
        }

        if let Some(cap) = RE_CALL_ME.captures(sentence) {
            out.push(Candidate::Preference(CandidatePreference {
                category: "communication".to_string(),
                key: "preferred_name".to_string(),
                value: cap[1].to_string(),
                confidence: 0.95,
            }));
            return;
        }

        if let Some(cap) = RE_LIKE.captures(sentence) {
            let verb = cap[2].to_lowercase();
            let object = clean_object(&cap[3]);
            if object.is_empty() || object.split_whitespace().count() > 6 {
                return;
            }
            let verb = match verb.as_str() {
                "love" => "loves",
                "like" => "likes",
                "enjoy" => "enjoys",
                "hate" => "hates",
                "dislike" => "dislikes",
                _ => "prefers",
            };
            let category = if mentions_food(&object) {
                FactCategory::Food
            } else {
                FactCategory::Preference
            };
            out.push(fact(format!("{verb} {object}"), category, Importance::Normal));
        }
    }
}

#[async_trait]
impl FactExtractor for RuleBasedExtractor {
    fn name(&self) -> &str {
        "rules"
    }

    async fn extract(&self, transcript: &Transcript) -> Result<Vec<Candidate>> {
        let mut out = Vec::new();
        for line in transcript.user_lines() {
            for sentence in RE_SENTENCE.split(line) {
                let sentence = sentence.trim();
                if !sentence.is_empty() {
                    self.sentence(sentence, &mut out);
                }
            }
        }
        Ok(out)
    }
}

fn fact(text: String, category: FactCategory, importance: Importance) -> Candidate {
    Candidate::Fact(CandidateFact {
        text,
        category,
        importance,
    })
}

/// Trim filler and trailing clauses off a captured object
fn clean_object(raw: &str) -> String {
    let mut object = raw.trim();
    for stop in [" but ", " and i ", " so ", " because "] {
        let found = object.to_lowercase().find(stop);
        if let Some(idx) = found.filter(|&i| object.is_char_boundary(i)) {
            object = &object[..idx];
        }
    }
    let object = object.trim_end_matches([',', ' ']);
    object
        .strip_suffix(" a lot")
        .or_else(|| object.strip_suffix(" very much"))
        .unwrap_or(object)
        .trim()
        .to_string()
}

fn mentions_food(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.split_whitespace().any(|w| FOOD_WORDS.contains(w))
        || FOOD_WORDS.iter().any(|w| w.contains(' ') && lower.contains(w))
}

fn preference_category(subject: &str) -> &'static str {
    if mentions_food(subject) {
        "food"
    } else if matches!(subject, "song" | "singer" | "band" | "music" | "movie" | "show" | "actor") {
        "entertainment"
    } else {
        "general"
    }
}
