//! New-vs-known identity decision and the record it produces.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use snoowatch_core::{Label, Mention};

use crate::resolver::resolve;
use crate::types::{Candidate, Classification};

/// What to do with a candidate given the persisted record for its identity.
#[derive(Debug, Clone, PartialEq)]
pub enum DedupOutcome {
    /// Unknown identity: insert this full record.
    New(Mention),
    /// Known identity whose volatile or automated fields changed.
    Update(Mention),
    /// Known identity with nothing to write.
    Unchanged(Mention),
}

impl DedupOutcome {
    #[must_use]
    pub fn into_mention(self) -> Mention {
        match self {
            DedupOutcome::New(m) | DedupOutcome::Update(m) | DedupOutcome::Unchanged(m) => m,
        }
    }
}

/// Reconcile a classified candidate against `existing`.
///
/// For a known identity only `num_comments` and the automated judgment are
/// refreshed, and `num_comments` only when the candidate carries one. Content fields, `ingested_at`, workflow flags and the manual
/// override layer come from the persisted record.
#[must_use]
pub fn reconcile(
    candidate: &Candidate,
    fresh: Classification,
    existing: Option<&Mention>,
    now: DateTime<Utc>,
) -> DedupOutcome {
    let Some(existing) = existing else {
        let mut mention = new_mention(candidate, now);
        resolve(fresh, None).apply_to(&mut mention);
        return DedupOutcome::New(mention);
    };

    let mut updated = existing.clone();
    if let Some(n) = candidate.num_comments {
        updated.num_comments = n;
    }
    resolve(fresh, Some(existing)).apply_to(&mut updated);

    if updated == *existing {
        DedupOutcome::Unchanged(updated)
    } else {
        DedupOutcome::Update(updated)
    }
}

fn new_mention(candidate: &Candidate, now: DateTime<Utc>) -> Mention {
    Mention {
        id: candidate.id.clone(),
        kind: candidate.kind,
        subreddit: candidate.subreddit.clone(),
        permalink: candidate.permalink.clone(),
        author: candidate.author.clone(),
        title: candidate.title.clone(),
        body: candidate.body.clone(),
        created_utc: candidate.created_utc,
        ingested_at: now,
        label: Label::Neutral,
        confidence: 0.0,
        score: 50,
        keywords_matched: BTreeSet::new(),
        manual_label: None,
        manual_score: None,
        tagged_by: None,
        tagged_at: None,
        ignored: false,
        ignored_at: None,
        urgent: false,
        num_comments: candidate.num_comments.unwrap_or(0),
    }
}
