//! Picking the facts worth putting in front of the LLM

use super::merge::tokens;
use chrono::{DateTime, Duration, Utc};
use jarvis_memory::{Fact, Importance};

/// Score of a fact against the current utterance.
///
/// Two points per shared keyword, five for critical facts, three for high
/// ones, and two more if the fact was referenced in the last seven days.
#[must_use]
pub fn relevance_score(fact: &Fact, context: &str, now: DateTime<Utc>) -> u32 {
    let context_words = tokens(context);
    let fact_words = tokens(&fact.text);
    let overlap = context_words.intersection(&fact_words).count() as u32;

    let mut score = overlap * 2;
    score += match fact.importance {
        Importance::Critical => 5,
        Importance::High => 3,
        _ => 0,
    };
    if now - fact.last_referenced < Duration::days(7) {
        score += 2;
    }
    score
}

/// Top `limit` facts with a positive score, best first
#[must_use]
pub fn relevant_facts(facts: &[Fact], context: &str, limit: usize, now: DateTime<Utc>) -> Vec<Fact> {
    let mut scored: Vec<(u32, &Fact)> = facts
        .iter()
        .map(|f| (relevance_score(f, context, now), f))
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then_with(|| b.1.last_referenced.cmp(&a.1.last_referenced))
    });
    scored
        .into_iter()
        .take(limit)
        .map(|(_, f)| f.clone())
        .collect()
}
