//! Ingestion run orchestration.

use chrono::{DateTime, Utc};
use snoowatch_core::{Lexicon, Mention};

use crate::classifier::Classifier;
use crate::dedup::{reconcile, DedupOutcome};
use crate::error::{SentimentError, StoreError};
use crate::matcher::{mention_text, KeywordMatcher};
use crate::sources::CandidateSource;
use crate::stats::{compute_learning_stats, LearningStats};
use crate::store::MentionStore;
use crate::types::{Candidate, Classification, RunError, RunSummary};

/// Writes attempted per candidate: the first, plus one retry after a conflict.
const MAX_PERSIST_ATTEMPTS: usize = 2;

/// Run one ingestion batch end to end.
///
/// 1. Refuse to start with an empty lexicon.
/// 2. Fetch raw candidates from `source`.
/// 3. For each: validate, match, classify, reconcile against `store`, persist.
/// 4. Return the accumulated [`RunSummary`].
///
/// A bad candidate is recorded in `errors` and skipped; it is never partially
/// written and will be retried on the next run.
///
/// # Errors
///
/// Returns [`SentimentError::Configuration`] for an empty lexicon (before any
/// write), or the source's error if nothing could be fetched.
pub async fn run_ingestion<S, F>(
    lexicon: &Lexicon,
    source: &F,
    store: &S,
) -> Result<RunSummary, SentimentError>
where
    S: MentionStore + ?Sized,
    F: CandidateSource + ?Sized,
{
    if lexicon.is_empty() {
        return Err(SentimentError::Configuration(
            "lexicon has no keywords; refusing to classify".to_string(),
        ));
    }

    let raw_candidates = source.fetch_candidates().await?;
    tracing::info!(candidates = raw_candidates.len(), "starting ingestion run");

    let matcher = KeywordMatcher::new(lexicon);
    let classifier = Classifier::new(*lexicon.policy());
    let mut run = RunAccumulator::default();

    for raw in raw_candidates {
        run.summary.total_processed += 1;

        let candidate = match Candidate::try_from(raw) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    mention_id = e.candidate_id().unwrap_or("<none>"),
                    error = %e,
                    "skipping malformed candidate"
                );
                run.record_error(e.candidate_id().map(ToString::to_string), e.to_string());
                continue;
            }
        };

        let text = mention_text(candidate.title.as_deref(), candidate.body.as_deref());
        if text.is_empty() {
            tracing::debug!(mention_id = %candidate.id, "candidate has no text; classifying as empty");
        }
        let matches = matcher.scan(&text);
        let classification = classifier.classify(&matches);

        let mut attempt = 1;
        let result = loop {
            match persist_candidate(store, &candidate, &classification, Utc::now()).await {
                Err(StoreError::Conflict(_)) if attempt < MAX_PERSIST_ATTEMPTS => {
                    tracing::warn!(
                        mention_id = %candidate.id,
                        "identity created concurrently; retrying merge against stored record"
                    );
                    attempt += 1;
                }
                other => break other,
            }
        };

        match result {
            Ok(outcome) => run.record_outcome(outcome),
            Err(e) => {
                tracing::warn!(mention_id = %candidate.id, error = %e, "failed to persist mention");
                run.record_error(Some(candidate.id.clone()), e.to_string());
            }
        }
    }

    let summary = run.finish(
        lexicon.policy().top_negative_below,
        lexicon.policy().top_negative_limit,
    );
    tracing::info!(
        new = summary.new_mentions,
        updated = summary.updated_mentions,
        unchanged = summary.unchanged_mentions,
        processed = summary.total_processed,
        errors = summary.errors.len(),
        "ingestion run complete"
    );
    Ok(summary)
}

/// Lookup, reconcile and write a single candidate.
async fn persist_candidate<S>(
    store: &S,
    candidate: &Candidate,
    classification: &Classification,
    now: DateTime<Utc>,
) -> Result<DedupOutcome, StoreError>
where
    S: MentionStore + ?Sized,
{
    let existing = store.lookup(&candidate.id).await?;
    let outcome = reconcile(candidate, classification.clone(), existing.as_ref(), now);
    match &outcome {
        DedupOutcome::New(m) => store.insert(m).await?,
        DedupOutcome::Update(m) => store.update(m).await?,
        DedupOutcome::Unchanged(_) => {}
    }
    Ok(outcome)
}

/// Explicit run state threaded through one batch.
#[derive(Default)]
struct RunAccumulator {
    summary: RunSummary,
    low_scoring: Vec<Mention>,
}

impl RunAccumulator {
    fn record_error(&mut self, candidate_id: Option<String>, reason: String) {
        self.summary.errors.push(RunError {
            candidate_id,
            reason,
        });
    }

    fn record_outcome(&mut self, outcome: DedupOutcome) {
        match &outcome {
            DedupOutcome::New(m) => {
                tracing::debug!(mention_id = %m.id, score = m.score, "new mention");
                self.summary.new_mentions += 1;
            }
            DedupOutcome::Update(m) => {
                tracing::debug!(mention_id = %m.id, "updated mention");
                self.summary.updated_mentions += 1;
            }
            DedupOutcome::Unchanged(_) => self.summary.unchanged_mentions += 1,
        }
        let mention = outcome.into_mention();
        // A later sighting of the same identity in this batch supersedes the earlier one.
        self.low_scoring.retain(|m| m.id != mention.id);
        self.low_scoring.push(mention);
    }

    fn finish(mut self, below: u8, limit: usize) -> RunSummary {
        let mut top: Vec<Mention> = self
            .low_scoring
            .into_iter()
            .filter(|m| m.effective_score() < below)
            .collect();
        top.sort_by(|a, b| {
            a.effective_score()
                .cmp(&b.effective_score())
                .then_with(|| b.confidence.total_cmp(&a.confidence))
                .then_with(|| a.id.cmp(&b.id))
        });
        top.truncate(limit);
        self.summary.top_negative = top;
        self.summary
    }
}

/// Clear `ignored` on every ignored mention in `mentions`; returns how many changed.
///
/// No other field is touched.
pub fn reset_ignored(mentions: &mut [Mention]) -> usize {
    let mut reset = 0;
    for mention in mentions.iter_mut().filter(|m| m.ignored) {
        mention.ignored = false;
        mention.ignored_at = None;
        reset += 1;
    }
    reset
}

/// Bulk ignore reset against the store collaborator.
///
/// # Errors
///
/// Returns [`SentimentError::Store`] if the store fails.
pub async fn reset_ignored_in_store<S>(store: &S) -> Result<usize, SentimentError>
where
    S: MentionStore + ?Sized,
{
    let reset = store.reset_ignored().await?;
    tracing::info!(reset, "cleared ignored flag");
    Ok(reset)
}

/// Compute a fresh learning-statistics snapshot from the full mention set.
///
/// # Errors
///
/// Returns [`SentimentError::Store`] if the scan fails.
pub async fn learning_stats<S>(store: &S) -> Result<LearningStats, SentimentError>
where
    S: MentionStore + ?Sized,
{
    let mentions = store.scan_all().await?;
    Ok(compute_learning_stats(&mentions))
}
