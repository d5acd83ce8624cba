//! Fetch collaborator contract and the Reddit implementation.

mod reddit;
mod reddit_helpers;
mod retry;

pub use reddit::{RedditSettings, RedditSource};

use async_trait::async_trait;

use crate::error::SentimentError;
use crate::types::RawCandidate;

/// Supplies the candidate records for one ingestion run.
///
/// Filtering by community and keyword happens here; the orchestrator does
/// not re-filter. Records are returned unvalidated.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SentimentError`] when no candidates could be fetched at all.
    async fn fetch_candidates(&self) -> Result<Vec<RawCandidate>, SentimentError>;
}
