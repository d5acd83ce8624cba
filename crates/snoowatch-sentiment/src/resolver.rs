//! Merge of a fresh automated judgment with any standing manual correction.
//!
//! This is the only place that decides precedence between automated and
//! manual fields. Nothing here ever creates a manual correction; that is the
//! tagging workflow's job.

use chrono::{DateTime, Utc};
use snoowatch_core::{Label, Mention};

use crate::types::Classification;

/// Human-entered fields carried forward from the persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualOverride {
    pub label: Option<Label>,
    pub score: Option<u8>,
    pub tagged_by: Option<String>,
    pub tagged_at: Option<DateTime<Utc>>,
}

impl ManualOverride {
    #[must_use]
    pub fn from_mention(mention: &Mention) -> Self {
        Self {
            label: mention.manual_label,
            score: mention.manual_score,
            tagged_by: mention.tagged_by.clone(),
            tagged_at: mention.tagged_at,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.score.is_none()
            && self.tagged_by.is_none()
            && self.tagged_at.is_none()
    }
}

/// Automated judgment plus whatever manual override stands on top of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    pub automated: Classification,
    pub manual: ManualOverride,
}

impl Judgment {
    #[must_use]
    pub fn effective_label(&self) -> Label {
        self.manual.label.unwrap_or(self.automated.label)
    }

    #[must_use]
    pub fn effective_score(&self) -> u8 {
        self.manual.score.unwrap_or(self.automated.score)
    }

    /// Write both layers onto `mention`, replacing its automated fields.
    pub fn apply_to(self, mention: &mut Mention) {
        mention.label = self.automated.label;
        mention.score = self.automated.score;
        mention.confidence = self.automated.confidence;
        mention.keywords_matched = self.automated.keywords_matched;

        mention.manual_label = self.manual.label;
        mention.manual_score = self.manual.score;
        mention.tagged_by = self.manual.tagged_by;
        mention.tagged_at = self.manual.tagged_at;
    }
}

/// Combine `fresh` with the manual layer of `prior`, if any.
///
/// The automated side is always the fresh one; the manual side is copied
/// forward untouched.
#[must_use]
pub fn resolve(fresh: Classification, prior: Option<&Mention>) -> Judgment {
    let manual = prior.map(ManualOverride::from_mention).unwrap_or_default();
    if !manual.is_empty() {
        tracing::trace!(
            mention_id = prior.map(|m| m.id.as_str()),
            "carrying manual override forward"
        );
    }
    Judgment {
        automated: fresh,
        manual,
    }
}
