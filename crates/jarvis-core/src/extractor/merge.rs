//! Merging candidates into long-term memory
//!
//! Facts accumulate: a candidate close enough to a stored fact only bumps
//! that fact's reference count (and raises its importance when the new
//! observation is more important). Text is never rewritten. Preferences go
//! through the store's atomic upsert.

use super::candidate::{Candidate, CandidateFact, CandidatePreference};
use crate::error::Result;
use jarvis_memory::{Fact, MemoryStore, PreferenceObservation};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};
use uuid::Uuid;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "the", "is", "am", "are", "was", "were", "be", "to", "of", "and", "or", "in",
        "on", "at", "for", "with", "by", "my", "i", "me", "he", "she", "they", "it", "his", "her",
        "their", "this", "that", "very", "really", "so", "too", "also", "user", "user's", "does",
        "do", "what", "who",
    ]
    .into_iter()
    .collect()
});

/// Normalised content words: lowercased, punctuation stripped, stop-words
/// removed, plural `s` dropped from longer words.
pub(crate) fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .map(|w| {
            if w.len() > 3 && w.ends_with('s') && !w.ends_with("ss") {
                w[..w.len() - 1].to_string()
            } else {
                w.to_string()
            }
        })
        .collect()
}

/// Jaccard similarity of the normalised token sets
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = tokens(a);
    let b = tokens(b);
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(&b).count();
    let union = a.union(&b).count();
    shared as f64 / union as f64
}

/// What to do with a candidate that matches no stored fact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactDecision {
    /// Store it as a new fact
    Insert,
    /// Count it as another observation of an existing fact
    Reinforce(Uuid),
    /// Drop it
    Skip,
}

/// Hook deciding how a new fact relates to what is already known.
///
/// Called only for candidates that are not near-duplicates of a stored
/// fact, so an implementation can look for contradictions ("son hates
/// cake" after "son loves cake") and decide accordingly.
pub trait ContradictionPolicy: Send + Sync {
    /// Decide on `candidate` given the user's current facts
    fn resolve(&self, existing: &[Fact], candidate: &CandidateFact) -> FactDecision;
}

/// Never invalidates anything; superseding facts are simply added.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppendOnly;

impl ContradictionPolicy for AppendOnly {
    fn resolve(&self, _existing: &[Fact], _candidate: &CandidateFact) -> FactDecision {
        FactDecision::Insert
    }
}

/// Counts of what a merge did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// New fact rows
    pub facts_inserted: usize,
    /// Existing facts whose reference count moved
    pub facts_reinforced: usize,
    /// Candidates dropped by the policy
    pub facts_skipped: usize,
    /// Preference upserts
    pub preferences_upserted: usize,
}

impl MergeReport {
    /// Whether anything was written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts_inserted + self.facts_reinforced + self.preferences_upserted == 0
    }
}

/// Applies candidates to the store
pub struct FactMerger {
    store: Arc<dyn MemoryStore>,
    threshold: f64,
    policy: Arc<dyn ContradictionPolicy>,
}

impl FactMerger {
    /// Create a merger with the given similarity threshold
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>, threshold: f64) -> Self {
        Self {
            store,
            threshold: threshold.clamp(0.0, 1.0),
            policy: Arc::new(AppendOnly),
        }
    }

    /// Set the contradiction policy
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn ContradictionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Merge `candidates` for `user_id`
    pub async fn merge(
        &self,
        user_id: Uuid,
        conversation_id: Option<Uuid>,
        candidates: Vec<Candidate>,
    ) -> Result<MergeReport> {
        let mut report = MergeReport::default();
        if candidates.is_empty() {
            return Ok(report);
        }

        let mut known = self.store.list_facts(user_id).await?;
        for candidate in candidates {
            match candidate {
                Candidate::Fact(fact) => {
                    self.merge_fact(user_id, conversation_id, &fact, &mut known, &mut report)
                        .await?;
                }
                Candidate::Preference(pref) => {
                    self.merge_preference(user_id, conversation_id, pref).await?;
                    report.preferences_upserted += 1;
                }
            }
        }

        info!(
            user_id = %user_id,
            inserted = report.facts_inserted,
            reinforced = report.facts_reinforced,
            preferences = report.preferences_upserted,
            "Merged extracted knowledge"
        );
        Ok(report)
    }

    async fn merge_fact(
        &self,
        user_id: Uuid,
        conversation_id: Option<Uuid>,
        candidate: &CandidateFact,
        known: &mut Vec<Fact>,
        report: &mut MergeReport,
    ) -> Result<()> {
        let decision = match self.closest(known, &candidate.text) {
            Some(id) => FactDecision::Reinforce(id),
            None => self.policy.resolve(known, candidate),
        };

        match decision {
            FactDecision::Insert => {
                let fact = Fact::new(user_id, &candidate.text, candidate.category, candidate.importance)
                    .with_source(conversation_id);
                self.store.insert_fact(&fact).await?;
                debug!(fact_id = %fact.id, "Fact inserted");
                known.push(fact);
                report.facts_inserted += 1;
            }
            FactDecision::Reinforce(id) => {
                let current = known.iter().find(|f| f.id == id).map(|f| f.importance);
                let raise_to = match current {
                    Some(importance) if candidate.importance > importance => Some(candidate.importance),
                    _ => None,
                };
                let updated = self.store.increment_fact_reference(id, raise_to).await?;
                debug!(fact_id = %id, references = updated.reference_count, "Fact reinforced");
                if let Some(slot) = known.iter_mut().find(|f| f.id == id) {
                    *slot = updated;
                }
                report.facts_reinforced += 1;
            }
            FactDecision::Skip => {
                report.facts_skipped += 1;
            }
        }
        Ok(())
    }

    async fn merge_preference(
        &self,
        user_id: Uuid,
        conversation_id: Option<Uuid>,
        pref: CandidatePreference,
    ) -> Result<()> {
        let observation = PreferenceObservation {
            user_id,
            category: pref.category,
            key: pref.key,
            value: pref.value,
            confidence: pref.confidence,
            source_conversation_id: conversation_id,
        };
        let stored = self.store.upsert_preference(&observation).await?;
        debug!(
            category = %stored.category,
            key = %stored.key,
            confidence = stored.confidence,
            "Preference upserted"
        );
        Ok(())
    }

    /// The most similar stored fact at or above the threshold
    fn closest(&self, known: &[Fact], text: &str) -> Option<Uuid> {
        known
            .iter()
            .map(|f| (f.id, similarity(&f.text, text)))
            .filter(|(_, score)| *score >= self.threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}
