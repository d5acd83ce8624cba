use thiserror::Error;

/// Batch-level failures. Anything returned here means the run produced no summary.
#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Reddit API error: {0}")]
    Reddit(String),

    /// HTTP 429. `reset_secs` comes from `x-ratelimit-reset` when Reddit sends it.
    #[error("Reddit rate limit exceeded (reset in {reset_secs:?} s)")]
    RateLimited { reset_secs: Option<u64> },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// A fetched record that does not satisfy the required-field contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("missing required field `{field}`")]
    MissingField {
        id: Option<String>,
        field: &'static str,
    },

    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        id: Option<String>,
        field: &'static str,
        reason: String,
    },
}

impl FetchError {
    /// Identity of the offending record, when it had one.
    #[must_use]
    pub fn candidate_id(&self) -> Option<&str> {
        match self {
            FetchError::MissingField { id, .. } | FetchError::InvalidField { id, .. } => {
                id.as_deref()
            }
        }
    }
}

/// Errors surfaced by a [`crate::store::MentionStore`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Another writer created the same identity first.
    #[error("identity conflict for mention {0}")]
    Conflict(String),

    #[error("mention {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}
