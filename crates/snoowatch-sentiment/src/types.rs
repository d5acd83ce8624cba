use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use snoowatch_core::{Label, Mention, MentionKind};

use crate::error::FetchError;

/// A record as handed over by the fetch collaborator, before validation.
///
/// Every field is optional so a malformed upstream record still reaches the
/// orchestrator and can be reported instead of silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub id: Option<String>,
    /// `post` or `comment`.
    pub kind: Option<String>,
    pub subreddit: Option<String>,
    pub permalink: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    /// Unix seconds, as Reddit reports it.
    pub created_utc: Option<f64>,
    pub num_comments: Option<i64>,
}

/// A validated candidate mention.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub kind: MentionKind,
    pub subreddit: String,
    pub permalink: String,
    pub author: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub created_utc: DateTime<Utc>,
    /// Always present for posts. Reddit does not report it for comments.
    pub num_comments: Option<u32>,
}

impl TryFrom<RawCandidate> for Candidate {
    type Error = FetchError;

    fn try_from(raw: RawCandidate) -> Result<Self, Self::Error> {
        let id = non_blank(raw.id).ok_or(FetchError::MissingField {
            id: None,
            field: "id",
        })?;

        let missing = |field: &'static str| FetchError::MissingField {
            id: Some(id.clone()),
            field,
        };
        let invalid = |field: &'static str, reason: String| FetchError::InvalidField {
            id: Some(id.clone()),
            field,
            reason,
        };

        let kind = non_blank(raw.kind)
            .ok_or_else(|| missing("kind"))?
            .parse::<MentionKind>()
            .map_err(|reason| invalid("kind", reason))?;
        let subreddit = non_blank(raw.subreddit).ok_or_else(|| missing("subreddit"))?;
        let permalink = non_blank(raw.permalink).ok_or_else(|| missing("permalink"))?;

        let created_secs = raw.created_utc.ok_or_else(|| missing("created_utc"))?;
        let created_utc = timestamp_from_secs(created_secs)
            .ok_or_else(|| invalid("created_utc", format!("not a valid timestamp: {created_secs}")))?;

        let num_comments = match (raw.num_comments, kind) {
            (None, MentionKind::Post) => return Err(missing("num_comments")),
            (None, MentionKind::Comment) => None,
            (Some(n), _) => {
                Some(u32::try_from(n).map_err(|_| invalid("num_comments", format!("{n}")))?)
            }
        };

        Ok(Self {
            id,
            kind,
            subreddit,
            permalink,
            author: non_blank(raw.author),
            title: non_blank(raw.title),
            body: non_blank(raw.body),
            created_utc,
            num_comments,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn timestamp_from_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let whole = secs.trunc() as i64;
    Utc.timestamp_opt(whole, 0).single()
}

/// The automated judgment produced for one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: Label,
    pub score: u8,
    pub confidence: f64,
    pub keywords_matched: BTreeSet<String>,
}

/// A candidate that could not be processed in this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunError {
    /// `None` when the record had no usable identity.
    pub candidate_id: Option<String>,
    pub reason: String,
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub new_mentions: usize,
    /// Known identities whose stored record changed.
    pub updated_mentions: usize,
    /// Known identities that needed no write.
    pub unchanged_mentions: usize,
    pub total_processed: usize,
    /// Mentions from this run under the low-score threshold, most negative first.
    pub top_negative: Vec<Mention>,
    pub errors: Vec<RunError>,
}
