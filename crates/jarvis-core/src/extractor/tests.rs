use super::*;
use jarvis_memory::{Fact, FactCategory, Importance, MemoryStore, Role, SqliteStore, User};
use uuid::Uuid;

async fn setup() -> (Arc<dyn MemoryStore>, User) {
    let store: Arc<dyn MemoryStore> = Arc::new(SqliteStore::in_memory().await.unwrap());
    let user = User::new("echo-kitchen", "Ravi", Role::Adult);
    store.create_user(&user).await.unwrap();
    (store, user)
}

fn fact_candidate(text: &str, importance: Importance) -> Candidate {
    Candidate::Fact(CandidateFact {
        text: text.to_string(),
        category: FactCategory::Family,
        importance,
    })
}

struct StuckExtractor;

#[async_trait]
impl FactExtractor for StuckExtractor {
    fn name(&self) -> &str {
        "stuck"
    }

    async fn extract(&self, _transcript: &Transcript) -> Result<Vec<Candidate>> {
        std::future::pending().await
    }
}

struct SkipEverything;

impl ContradictionPolicy for SkipEverything {
    fn resolve(&self, _existing: &[Fact], _candidate: &CandidateFact) -> FactDecision {
        FactDecision::Skip
    }
}

#[test]
fn test_similarity() {
    assert_eq!(similarity("Son loves chocolate cake", "son loves chocolate cakes!"), 1.0);
    assert!(similarity("son loves chocolate cake", "daughter loves chocolate ice cream") < 0.5);
    assert_eq!(similarity("", ""), 0.0);
}

#[tokio::test]
async fn test_extraction_is_idempotent() {
    let (store, user) = setup().await;
    let pipeline = MemoryExtractor::new(
        Arc::new(RuleBasedExtractor::new()),
        FactMerger::new(Arc::clone(&store), 0.8),
    );
    let transcript = Transcript::turn(
        user.id,
        None,
        "My son loves chocolate cake. My favourite dessert is gulab jamun",
        "Noted, I'll remember that.",
    );

    let first = pipeline.process(&transcript).await.unwrap();
    assert_eq!(first.facts_inserted, 1);
    assert_eq!(first.preferences_upserted, 1);
    let pref_before = store
        .get_preference(user.id, "food", "favourite_dessert")
        .await
        .unwrap()
        .unwrap();

    let second = pipeline.process(&transcript).await.unwrap();
    assert_eq!(second.facts_inserted, 0);
    assert_eq!(second.facts_reinforced, 1);

    let facts = store.list_facts(user.id).await.unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].text, "son loves chocolate cake");
    assert_eq!(facts[0].reference_count, 2);

    let pref_after = store
        .get_preference(user.id, "food", "favourite_dessert")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pref_after.value, pref_before.value);
    assert_eq!(pref_after.confidence, pref_before.confidence);
    assert_eq!(pref_after.updated_at, pref_before.updated_at);
    assert_eq!(store.list_preferences(user.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reinforce_raises_importance_keeps_text() {
    let (store, user) = setup().await;
    let merger = FactMerger::new(Arc::clone(&store), 0.8);

    merger
        .merge(user.id, None, vec![fact_candidate("son loves chocolate cake", Importance::Normal)])
        .await
        .unwrap();
    let report = merger
        .merge(user.id, None, vec![fact_candidate("Son loves chocolate cakes!", Importance::High)])
        .await
        .unwrap();
    assert_eq!(report.facts_reinforced, 1);

    let facts = store.list_facts(user.id).await.unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].text, "son loves chocolate cake");
    assert_eq!(facts[0].importance, Importance::High);

    // A lower importance never demotes
    merger
        .merge(user.id, None, vec![fact_candidate("son loves chocolate cake", Importance::Low)])
        .await
        .unwrap();
    let facts = store.list_facts(user.id).await.unwrap();
    assert_eq!(facts[0].importance, Importance::High);
    assert_eq!(facts[0].reference_count, 3);
}

#[tokio::test]
async fn test_duplicates_within_one_batch() {
    let (store, user) = setup().await;
    let merger = FactMerger::new(Arc::clone(&store), 0.8);

    let report = merger
        .merge(
            user.id,
            None,
            vec![
                fact_candidate("son loves chocolate cake", Importance::Normal),
                fact_candidate("son loves chocolate cake", Importance::Normal),
            ],
        )
        .await
        .unwrap();
    assert_eq!(report.facts_inserted, 1);
    assert_eq!(report.facts_reinforced, 1);
    assert_eq!(store.list_facts(user.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_contradiction_policy_consulted() {
    let (store, user) = setup().await;
    let merger =
        FactMerger::new(Arc::clone(&store), 0.8).with_policy(Arc::new(SkipEverything));

    let report = merger
        .merge(user.id, None, vec![fact_candidate("son hates broccoli", Importance::Normal)])
        .await
        .unwrap();
    assert_eq!(report.facts_skipped, 1);
    assert!(report.is_empty());
    assert!(store.list_facts(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_preference_last_write_wins() {
    let (store, user) = setup().await;
    let merger = FactMerger::new(Arc::clone(&store), 0.8);
    let pref = |value: &str, confidence: f64| {
        Candidate::Preference(CandidatePreference {
            category: "food".into(),
            key: "spice_level".into(),
            value: value.into(),
            confidence,
        })
    };

    merger.merge(user.id, None, vec![pref("medium", 0.9)]).await.unwrap();
    merger.merge(user.id, None, vec![pref("mild", 0.6)]).await.unwrap();

    let stored = store
        .get_preference(user.id, "food", "spice_level")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.value, "mild");
    assert_eq!(stored.confidence, 0.9);
}

#[tokio::test]
async fn test_short_transcript_skipped() {
    let (store, user) = setup().await;
    let provider = Arc::new(jarvis_llm::MockProvider::new());
    let pipeline = MemoryExtractor::new(
        Arc::new(LlmFactExtractor::new(provider.clone(), "gpt-4o-mini")),
        FactMerger::new(Arc::clone(&store), 0.8),
    )
    .with_min_transcript_chars(20);

    let transcript = Transcript::turn(user.id, Some(Uuid::new_v4()), "hi", "Hello!");
    let report = pipeline.process(&transcript).await.unwrap();
    assert!(report.is_empty());
    assert!(provider.recorded_completions().is_empty());
}

#[tokio::test]
async fn test_stuck_extractor_times_out() {
    let (store, user) = setup().await;
    let pipeline = MemoryExtractor::new(
        Arc::new(StuckExtractor),
        FactMerger::new(Arc::clone(&store), 0.8),
    )
    .with_timeout(std::time::Duration::from_millis(20));

    let transcript = Transcript::turn(user.id, None, "my son loves chocolate cake", "Lovely!");
    let err = pipeline.process(&transcript).await.unwrap_err();
    assert!(matches!(err, crate::error::Error::Extraction(ref msg) if msg.contains("stuck")));
    assert!(store.list_facts(user.id).await.unwrap().is_empty());
}
