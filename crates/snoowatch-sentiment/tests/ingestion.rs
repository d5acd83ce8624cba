//! End-to-end ingestion runs against the in-memory store.
//!
//! A fixed `StaticSource` stands in for the Reddit collaborator so each test
//! controls exactly which raw records a run sees.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use snoowatch_core::{parse_lexicon, Label, Lexicon};
use snoowatch_sentiment::{
    learning_stats, reset_ignored_in_store, run_ingestion, CandidateSource, MemoryStore,
    MentionStore, RawCandidate, SentimentError,
};

const LEXICON: &str = r"
keywords:
  - { term: terrible, polarity: -1, weight: 5 }
  - { term: love, polarity: 1, weight: 3 }
  - { term: scam, polarity: -1, weight: 8 }
  - { term: refund, polarity: 0, weight: 1 }
";

fn lexicon() -> Lexicon {
    parse_lexicon(LEXICON).expect("test lexicon is valid")
}

struct StaticSource {
    batch: Mutex<Vec<RawCandidate>>,
}

impl StaticSource {
    fn new(batch: Vec<RawCandidate>) -> Self {
        Self {
            batch: Mutex::new(batch),
        }
    }

    fn replace(&self, batch: Vec<RawCandidate>) {
        *self.batch.lock().unwrap() = batch;
    }
}

#[async_trait]
impl CandidateSource for StaticSource {
    async fn fetch_candidates(&self) -> Result<Vec<RawCandidate>, SentimentError> {
        Ok(self.batch.lock().unwrap().clone())
    }
}

struct FailingSource;

#[async_trait]
impl CandidateSource for FailingSource {
    async fn fetch_candidates(&self) -> Result<Vec<RawCandidate>, SentimentError> {
        Err(SentimentError::Reddit("token exchange failed".to_string()))
    }
}

fn post(id: &str, title: &str, body: Option<&str>, num_comments: i64) -> RawCandidate {
    RawCandidate {
        id: Some(id.to_string()),
        kind: Some("post".to_string()),
        subreddit: Some("acme".to_string()),
        permalink: Some(format!("/r/acme/comments/{id}/")),
        author: Some("someone".to_string()),
        title: Some(title.to_string()),
        body: body.map(ToString::to_string),
        created_utc: Some(1_710_000_000.0),
        num_comments: Some(num_comments),
    }
}

fn batch() -> Vec<RawCandidate> {
    vec![
        post("t3_a", "terrible service, I love the food", None, 1),
        post("t3_b", "total scam", Some("want a refund"), 4),
        post("t3_c", "love this", None, 0),
        post("t3_d", "nothing to see", None, 0),
    ]
}

#[tokio::test]
async fn second_run_over_same_batch_creates_nothing() {
    let lexicon = lexicon();
    let source = StaticSource::new(batch());
    let store = MemoryStore::new();

    let first = run_ingestion(&lexicon, &source, &store).await.unwrap();
    assert_eq!(first.new_mentions, 4);
    assert_eq!(first.total_processed, 4);
    assert!(first.errors.is_empty());
    assert_eq!(store.len(), 4);

    let second = run_ingestion(&lexicon, &source, &store).await.unwrap();
    assert_eq!(second.new_mentions, 0);
    assert_eq!(second.unchanged_mentions, 4);
    assert_eq!(second.total_processed, 4);
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn scenario_text_scores_62_positive() {
    let lexicon = lexicon();
    let source = StaticSource::new(vec![post(
        "t3_a",
        "terrible service, I love the food",
        None,
        0,
    )]);
    let store = MemoryStore::new();
    run_ingestion(&lexicon, &source, &store).await.unwrap();

    let m = store.get("t3_a").unwrap();
    assert_eq!(m.score, 62);
    assert_eq!(m.label, Label::Positive);
    assert_eq!(
        m.keywords_matched.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["love", "terrible"]
    );
}

#[tokio::test]
async fn zero_match_text_is_neutral_fifty() {
    let lexicon = lexicon();
    let source = StaticSource::new(vec![post("t3_d", "nothing to see", None, 0)]);
    let store = MemoryStore::new();
    run_ingestion(&lexicon, &source, &store).await.unwrap();

    let m = store.get("t3_d").unwrap();
    assert_eq!(m.score, 50);
    assert_eq!(m.label, Label::Neutral);
    assert!(m.confidence.abs() < f64::EPSILON);
}

#[tokio::test]
async fn manual_override_survives_reingestion_with_new_text() {
    let lexicon = lexicon();
    let source = StaticSource::new(batch());
    let store = MemoryStore::new();
    run_ingestion(&lexicon, &source, &store).await.unwrap();

    let tagged_at = Utc::now();
    store
        .tag("t3_c", Label::Negative, Some(15), "reviewer", tagged_at)
        .unwrap();
    let before = store.get("t3_c").unwrap();

    // Same identity, edited text and more comments.
    source.replace(vec![post("t3_c", "this is a scam", None, 12)]);
    let summary = run_ingestion(&lexicon, &source, &store).await.unwrap();
    assert_eq!(summary.new_mentions, 0);
    assert_eq!(summary.updated_mentions, 1);

    let after = store.get("t3_c").unwrap();
    assert_eq!(after.manual_label, before.manual_label);
    assert_eq!(after.manual_score, before.manual_score);
    assert_eq!(after.tagged_by, before.tagged_by);
    assert_eq!(after.tagged_at, before.tagged_at);
    assert_eq!(after.effective_label(), Label::Negative);
    assert_ne!(after.score, before.score, "automated score was recomputed");
    assert_eq!(after.num_comments, 12);
    assert_eq!(after.ingested_at, before.ingested_at);
}

#[tokio::test]
async fn ignored_flag_survives_comment_count_update() {
    let lexicon = lexicon();
    let source = StaticSource::new(batch());
    let store = MemoryStore::new();
    run_ingestion(&lexicon, &source, &store).await.unwrap();

    store.set_ignored("t3_b", true, Utc::now()).await.unwrap();
    store.set_urgent("t3_b", true).unwrap();

    source.replace(vec![post("t3_b", "total scam", Some("want a refund"), 40)]);
    let summary = run_ingestion(&lexicon, &source, &store).await.unwrap();
    assert_eq!(summary.updated_mentions, 1);

    let m = store.get("t3_b").unwrap();
    assert!(m.ignored);
    assert!(m.urgent);
    assert_eq!(m.num_comments, 40);
}

#[tokio::test]
async fn post_resighted_without_comment_count_is_rejected_and_keeps_count() {
    let lexicon = lexicon();
    let source = StaticSource::new(vec![post("t3_x", "love this", None, 12)]);
    let store = MemoryStore::new();
    run_ingestion(&lexicon, &source, &store).await.unwrap();

    source.replace(vec![RawCandidate {
        num_comments: None,
        ..post("t3_x", "love this", None, 0)
    }]);
    let summary = run_ingestion(&lexicon, &source, &store).await.unwrap();
    assert_eq!(summary.updated_mentions, 0);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].candidate_id.as_deref(), Some("t3_x"));
    assert!(summary.errors[0].reason.contains("num_comments"));
    assert_eq!(store.get("t3_x").unwrap().num_comments, 12);
}

#[tokio::test]
async fn comment_resighting_leaves_stored_count_alone() {
    let lexicon = lexicon();
    let comment = RawCandidate {
        id: Some("t1_x".to_string()),
        kind: Some("comment".to_string()),
        title: None,
        body: Some("terrible".to_string()),
        num_comments: None,
        ..post("t1_x", "", None, 0)
    };
    let source = StaticSource::new(vec![comment]);
    let first_store = MemoryStore::new();
    let first = run_ingestion(&lexicon, &source, &first_store).await.unwrap();
    assert!(first.errors.is_empty());
    assert_eq!(first.new_mentions, 1);

    // Seed a count the comment listing never reports.
    let mut seeded = first_store.get("t1_x").unwrap();
    seeded.num_comments = 5;
    let store = MemoryStore::with_mentions([seeded]);

    let second = run_ingestion(&lexicon, &source, &store).await.unwrap();
    assert!(second.errors.is_empty());
    assert_eq!(second.unchanged_mentions, 1);
    assert_eq!(store.get("t1_x").unwrap().num_comments, 5);
}

#[tokio::test]
async fn malformed_records_are_reported_and_do_not_stop_the_run() {
    let lexicon = lexicon();
    let mut records = batch();
    records.insert(
        1,
        RawCandidate {
            permalink: None,
            ..post("t3_bad", "scam", None, 0)
        },
    );
    records.push(RawCandidate::default());
    let source = StaticSource::new(records);
    let store = MemoryStore::new();

    let summary = run_ingestion(&lexicon, &source, &store).await.unwrap();
    assert_eq!(summary.total_processed, 6);
    assert_eq!(summary.new_mentions, 4);
    assert_eq!(summary.errors.len(), 2);
    assert_eq!(summary.errors[0].candidate_id.as_deref(), Some("t3_bad"));
    assert!(summary.errors[0].reason.contains("permalink"));
    assert_eq!(summary.errors[1].candidate_id, None);
    assert!(store.get("t3_bad").is_none());
}

#[tokio::test]
async fn missing_title_and_body_is_classified_as_empty_text() {
    let lexicon = lexicon();
    let source = StaticSource::new(vec![RawCandidate {
        title: None,
        body: None,
        ..post("t1_empty", "", None, 0)
    }]);
    let store = MemoryStore::new();
    let summary = run_ingestion(&lexicon, &source, &store).await.unwrap();

    assert!(summary.errors.is_empty());
    assert_eq!(store.get("t1_empty").unwrap().score, 50);
}

#[tokio::test]
async fn empty_lexicon_fails_before_any_write() {
    let empty = parse_lexicon("keywords: []").unwrap();
    let source = StaticSource::new(batch());
    let store = MemoryStore::new();

    let err = run_ingestion(&empty, &source, &store).await.unwrap_err();
    assert!(matches!(err, SentimentError::Configuration(_)), "got {err:?}");
    assert!(store.is_empty());
}

#[tokio::test]
async fn total_fetch_failure_is_a_batch_error() {
    let store = MemoryStore::new();
    let err = run_ingestion(&lexicon(), &FailingSource, &store)
        .await
        .unwrap_err();
    assert!(matches!(err, SentimentError::Reddit(_)));
}

#[tokio::test]
async fn single_conflict_is_retried_against_the_stored_record() {
    let lexicon = lexicon();
    let source = StaticSource::new(vec![post("t3_race", "scam", None, 0)]);
    let store = MemoryStore::new();
    store.inject_conflicts(1);

    let summary = run_ingestion(&lexicon, &source, &store).await.unwrap();
    assert!(summary.errors.is_empty(), "{:?}", summary.errors);
    assert_eq!(summary.new_mentions, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn repeated_conflict_is_recorded_as_an_error() {
    let lexicon = lexicon();
    let source = StaticSource::new(vec![
        post("t3_race", "scam", None, 0),
        post("t3_ok", "love", None, 0),
    ]);
    let store = MemoryStore::new();
    store.inject_conflicts(2);

    let summary = run_ingestion(&lexicon, &source, &store).await.unwrap();
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].candidate_id.as_deref(), Some("t3_race"));
    assert!(summary.errors[0].reason.contains("conflict"));
    assert_eq!(summary.new_mentions, 1);
    assert!(store.get("t3_race").is_none());
}

#[tokio::test]
async fn top_negative_lists_low_scores_most_negative_first() {
    let yaml = r"
keywords:
  - { term: outage, polarity: 1, weight: 2 }
  - { term: down, polarity: 1, weight: 2 }
  - { term: slow, polarity: -1, weight: 1 }
";
    let lexicon = parse_lexicon(yaml).unwrap();
    let source = StaticSource::new(vec![
        post("t3_1", "outage again", None, 0),
        post("t3_2", "site is down, slow too", None, 0),
        post("t3_3", "outage, site down", None, 0),
        post("t3_4", "slow", None, 0),
    ]);
    let store = MemoryStore::new();
    let summary = run_ingestion(&lexicon, &source, &store).await.unwrap();

    let scores: Vec<(&str, u8)> = summary
        .top_negative
        .iter()
        .map(|m| (m.id.as_str(), m.score))
        .collect();
    // t3_1 and t3_3: ratio 1 → 1; t3_2: ratio 1/3 → 34 (not below 30).
    assert_eq!(scores, vec![("t3_3", 1), ("t3_1", 1)]);
}

#[tokio::test]
async fn reset_scenario_clears_three_of_five() {
    let lexicon = lexicon();
    let mut records = batch();
    records.push(post("t3_e", "refund please", None, 0));
    let source = StaticSource::new(records);
    let store = MemoryStore::new();
    run_ingestion(&lexicon, &source, &store).await.unwrap();
    assert_eq!(store.len(), 5);

    for id in ["t3_a", "t3_c", "t3_e"] {
        store.set_ignored(id, true, Utc::now()).await.unwrap();
    }

    let reset = reset_ignored_in_store(&store).await.unwrap();
    assert_eq!(reset, 3);
    let all = store.scan_all().await.unwrap();
    assert!(all.iter().all(|m| !m.ignored && m.ignored_at.is_none()));
}

#[tokio::test]
async fn learning_stats_track_manual_corrections() {
    let lexicon = lexicon();
    let source = StaticSource::new(batch());
    let store = MemoryStore::new();
    run_ingestion(&lexicon, &source, &store).await.unwrap();

    let stats = learning_stats(&store).await.unwrap();
    assert_eq!(stats.total_mentions, 4);
    assert_eq!(stats.tagged_count, 0);
    assert!(stats.overall_agreement.is_none());

    // t3_b is automatically labelled positive by the formula (net negative → high score).
    let b = store.get("t3_b").unwrap();
    store.tag("t3_b", b.label, None, "reviewer", Utc::now()).unwrap();
    store
        .tag("t3_c", Label::Neutral, None, "reviewer", Utc::now())
        .unwrap();

    let stats = learning_stats(&store).await.unwrap();
    assert_eq!(stats.tagged_count, 2);
    assert_eq!(stats.overall_agreement, Some(0.5));
    assert_eq!(stats.per_keyword_agreement["scam"], Some(1.0));
    assert_eq!(stats.per_keyword_agreement["love"], Some(0.0));
    assert_eq!(stats.per_keyword_agreement["terrible"], None);
}
