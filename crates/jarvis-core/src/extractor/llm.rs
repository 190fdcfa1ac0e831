//! LLM-backed extraction

use super::candidate::{Candidate, CandidateFact, CandidatePreference, Transcript};
use super::FactExtractor;
use crate::error::{Error, Result};
use async_trait::async_trait;
use jarvis_llm::{CompletionRequest, LlmProvider, Message};
use jarvis_memory::{FactCategory, Importance};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const EXTRACTION_SYSTEM: &str =
    "You extract facts and preferences from conversations. Respond ONLY with valid JSON.";

const EXTRACTION_PROMPT: &str = r#"Extract durable facts and preferences about the user from this conversation.

Return JSON in exactly this shape:
{
  "facts": [{"fact": "...", "category": "food|health|habit|preference|family|work|other", "importance": "low|normal|high|critical"}],
  "preferences": [{"category": "food|communication|schedule|shopping|other", "key": "...", "value": "...", "confidence": 0.0}]
}

Only concrete facts, no guesses. Health and safety information (allergies, medicines) is critical.
Skip chitchat. Return empty arrays when nothing is worth keeping.

CONVERSATION:
"#;

#[derive(Debug, Default, Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    facts: Vec<RawFact>,
    #[serde(default)]
    preferences: Vec<RawPreference>,
}

#[derive(Debug, Deserialize)]
struct RawFact {
    fact: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    importance: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPreference {
    #[serde(default)]
    category: Option<String>,
    key: String,
    value: String,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Confidence assumed when the model does not give one
const DEFAULT_CONFIDENCE: f64 = 0.7;

/// Extractor that asks the LLM for structured candidates
pub struct LlmFactExtractor {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl LlmFactExtractor {
    /// Create an extractor using `model`
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 1000,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the completion token limit
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Give up on the extraction call after `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl FactExtractor for LlmFactExtractor {
    fn name(&self) -> &str {
        "llm"
    }

    async fn extract(&self, transcript: &Transcript) -> Result<Vec<Candidate>> {
        let request = CompletionRequest::new(&self.model)
            .with_message(Message::system(EXTRACTION_SYSTEM))
            .with_message(Message::user(format!(
                "{EXTRACTION_PROMPT}{}",
                transcript.render()
            )))
            .with_max_tokens(self.max_tokens)
            .with_temperature(0.0);

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                Error::Extraction(format!(
                    "extraction call timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })?
            .map_err(|e| Error::Extraction(format!("extraction call failed: {e}")))?;
        let candidates = parse_candidates(&response.content)?;
        debug!(count = candidates.len(), "LLM extraction parsed");
        Ok(candidates)
    }
}

/// Parse the model's JSON reply. Code fences around the JSON are tolerated
/// and unknown categories fall back to `other`.
pub fn parse_candidates(raw: &str) -> Result<Vec<Candidate>> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Ok(Vec::new());
    }
    let payload: ExtractionPayload = serde_json::from_str(body)
        .map_err(|e| Error::Extraction(format!("invalid extraction JSON: {e}")))?;

    let facts = payload
        .facts
        .into_iter()
        .filter(|f| !f.fact.trim().is_empty())
        .map(|f| {
            Candidate::Fact(CandidateFact {
                text: f.fact.trim().to_string(),
                category: f
                    .category
                    .as_deref()
                    .map_or(FactCategory::Other, FactCategory::from_str_lossy),
                importance: f
                    .importance
                    .as_deref()
                    .and_then(|s| Importance::parse(&s.trim().to_lowercase()))
                    .unwrap_or(Importance::Normal),
            })
        });

    let preferences = payload
        .preferences
        .into_iter()
        .filter(|p| !p.key.trim().is_empty() && !p.value.trim().is_empty())
        .map(|p| {
            Candidate::Preference(CandidatePreference {
                category: p
                    .category
                    .map(|c| c.trim().to_lowercase())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| "other".to_string()),
                key: p.key.trim().to_lowercase().replace(' ', "_"),
                value: p.value.trim().to_string(),
                confidence: p.confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0),
            })
        });

    Ok(facts.chain(preferences).collect())
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_llm::MockProvider;
    use uuid::Uuid;

    #[test]
    fn test_parse_fenced_payload() {
        let raw = "```json\n{\"facts\": [{\"fact\": \"Son loves chocolate cake\", \"category\": \"family\", \"importance\": \"normal\"}], \"preferences\": [{\"category\": \"Food\", \"key\": \"spice level\", \"value\": \"mild\"}], \"summary\": \"Talked about cake\"}\n```";
        let out = parse_candidates(raw).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0],
            Candidate::Fact(CandidateFact {
                text: "Son loves chocolate cake".into(),
                category: FactCategory::Family,
                importance: Importance::Normal,
            })
        );
        let Candidate::Preference(pref) = &out[1] else {
            panic!("expected preference");
        };
        assert_eq!(pref.category, "food");
        assert_eq!(pref.key, "spice_level");
        assert_eq!(pref.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_unknown_category_and_importance() {
        let raw = r#"{"facts": [{"fact": "plays cricket on sundays", "category": "sports", "importance": "urgent"}, {"fact": "  "}]}"#;
        let out = parse_candidates(raw).unwrap();
        assert_eq!(out.len(), 1);
        assert!(matches!(
            &out[0],
            Candidate::Fact(f) if f.category == FactCategory::Other && f.importance == Importance::Normal
        ));
    }

    #[test]
    fn test_garbage_is_extraction_error() {
        let err = parse_candidates("I could not find any facts.").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert!(parse_candidates("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_contains_transcript_only() {
        let provider = Arc::new(MockProvider::new());
        provider.add_completion(Ok(r#"{"facts": [], "preferences": []}"#.to_string()));

        let extractor = LlmFactExtractor::new(provider.clone(), "gpt-4o-mini");
        let transcript =
            Transcript::turn(Uuid::new_v4(), None, "my son loves chocolate cake", "How sweet!");
        assert!(extractor.extract(&transcript).await.unwrap().is_empty());

        let sent = provider.recorded_completions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].model, "gpt-4o-mini");
        let prompt = &sent[0].messages[1].content;
        assert!(prompt.ends_with("User: my son loves chocolate cake\nAssistant: How sweet!"));
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_extraction_error() {
        let provider = Arc::new(MockProvider::new());
        provider.add_completion(Err(jarvis_llm::Error::Network("reset".into())));
        let extractor = LlmFactExtractor::new(provider, "gpt-4o-mini");

        let transcript = Transcript::turn(Uuid::new_v4(), None, "hello there", "Hi!");
        let err = extractor.extract(&transcript).await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[tokio::test]
    async fn test_hung_provider_times_out() {
        let provider = Arc::new(MockProvider::new().with_stalled_completions());
        let extractor = LlmFactExtractor::new(provider, "gpt-4o-mini")
            .with_timeout(Duration::from_millis(20));

        let transcript = Transcript::turn(Uuid::new_v4(), None, "my son loves cake", "Nice!");
        let err = extractor.extract(&transcript).await.unwrap_err();
        assert!(matches!(err, Error::Extraction(ref msg) if msg.contains("timed out")));
    }
}
