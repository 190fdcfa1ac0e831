//! Fact Extractor - Long-term memory from finished turns
//!
//! An extractor turns a user/assistant exchange into candidate facts and
//! preferences; the [`FactMerger`] folds them into the store without
//! creating duplicates. Running the same transcript twice only moves
//! reference counts.
//!
//! # Module Structure
//!
//! - `candidate`: transcript and candidate types
//! - `rules`: pattern-based extractor
//! - `llm`: LLM-backed extractor
//! - `merge`: similarity matching and the contradiction hook
//! - `relevance`: fact scoring for prompt context
//! - `summary`: session summaries

mod candidate;
mod llm;
mod merge;
mod relevance;
mod rules;
mod summary;

#[cfg(test)]
mod tests;

pub use candidate::{Candidate, CandidateFact, CandidatePreference, Transcript, TranscriptLine};
pub use llm::{parse_candidates, LlmFactExtractor};
pub use merge::{similarity, AppendOnly, ContradictionPolicy, FactDecision, FactMerger, MergeReport};
pub use relevance::{relevance_score, relevant_facts};
pub use rules::RuleBasedExtractor;
pub use summary::SessionSummarizer;

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Produces candidate knowledge from a transcript
#[async_trait]
pub trait FactExtractor: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Extract candidates. Only user and assistant lines are ever passed in.
    async fn extract(&self, transcript: &Transcript) -> Result<Vec<Candidate>>;
}

/// Extraction followed by merging
pub struct MemoryExtractor {
    extractor: Arc<dyn FactExtractor>,
    merger: FactMerger,
    min_transcript_chars: usize,
    timeout: Duration,
}

impl MemoryExtractor {
    /// Create a pipeline
    #[must_use]
    pub fn new(extractor: Arc<dyn FactExtractor>, merger: FactMerger) -> Self {
        Self {
            extractor,
            merger,
            min_transcript_chars: 20,
            timeout: Duration::from_secs(30),
        }
    }

    /// Transcripts shorter than this are not worth an extraction call
    #[must_use]
    pub fn with_min_transcript_chars(mut self, chars: usize) -> Self {
        self.min_transcript_chars = chars;
        self
    }

    /// Upper bound on a single `extract` call
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Name of the underlying extractor
    #[must_use]
    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    /// Extract from `transcript` and merge into the store
    #[instrument(skip(self, transcript), fields(extractor = %self.extractor.name(), user_id = %transcript.user_id))]
    pub async fn process(&self, transcript: &Transcript) -> Result<MergeReport> {
        if transcript.char_len() < self.min_transcript_chars {
            debug!(chars = transcript.char_len(), "Transcript too short, skipping extraction");
            return Ok(MergeReport::default());
        }

        let candidates = tokio::time::timeout(self.timeout, self.extractor.extract(transcript))
            .await
            .map_err(|_| {
                Error::Extraction(format!(
                    "{} extractor timed out after {}ms",
                    self.extractor.name(),
                    self.timeout.as_millis()
                ))
            })??;
        debug!(candidates = candidates.len(), "Candidates extracted");
        self.merger
            .merge(transcript.user_id, transcript.conversation_id, candidates)
            .await
    }
}
