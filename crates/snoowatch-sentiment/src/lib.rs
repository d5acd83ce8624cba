//! Classification-and-reconciliation core for snoowatch.
//!
//! Matches Reddit posts and comments against a weighted keyword lexicon,
//! scores and labels them, reconciles each against the stored record for its
//! identity (keeping human corrections and workflow flags), and reports how
//! well the automated labels agree with human review.

pub mod classifier;
pub mod dedup;
pub mod error;
pub mod matcher;
pub mod pipeline;
pub mod resolver;
pub mod sources;
pub mod stats;
pub mod store;
pub mod types;

pub use classifier::{label_for_score, Classifier};
pub use dedup::{reconcile, DedupOutcome};
pub use error::{FetchError, SentimentError, StoreError};
pub use matcher::{mention_text, KeywordMatch, KeywordMatcher, MatchSet};
pub use pipeline::{learning_stats, reset_ignored, reset_ignored_in_store, run_ingestion};
pub use resolver::{resolve, Judgment, ManualOverride};
pub use sources::{CandidateSource, RedditSettings, RedditSource};
pub use stats::{compute_learning_stats, KeywordAgreement, LearningStats};
pub use store::{MemoryStore, MentionStore};
pub use types::{Candidate, Classification, RawCandidate, RunError, RunSummary};
