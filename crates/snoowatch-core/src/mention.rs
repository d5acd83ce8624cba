use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Negative,
    Neutral,
    Positive,
}

impl Label {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Negative => "negative",
            Label::Neutral => "neutral",
            Label::Positive => "positive",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "negative" => Ok(Label::Negative),
            "neutral" => Ok(Label::Neutral),
            "positive" => Ok(Label::Positive),
            other => Err(format!("unknown label '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionKind {
    Post,
    Comment,
}

impl MentionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MentionKind::Post => "post",
            MentionKind::Comment => "comment",
        }
    }
}

impl fmt::Display for MentionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MentionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(MentionKind::Post),
            "comment" => Ok(MentionKind::Comment),
            other => Err(format!("unknown mention kind '{other}'")),
        }
    }
}

/// One ingested post or comment that matched the keyword lexicon.
///
/// The automated judgment (`label`, `confidence`, `score`, `keywords_matched`)
/// is always kept up to date by ingestion, but consumers must read through
/// [`Mention::effective_label`] and [`Mention::effective_score`] so a manual
/// correction wins once it exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Platform-native identifier (`t3_…` / `t1_…` fullname for Reddit).
    pub id: String,
    pub kind: MentionKind,
    pub subreddit: String,
    pub permalink: String,
    pub author: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub created_utc: DateTime<Utc>,
    /// First time this identity was seen. Never rewritten.
    pub ingested_at: DateTime<Utc>,

    pub label: Label,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// In `[1, 100]`, 1 being most negative.
    pub score: u8,
    pub keywords_matched: BTreeSet<String>,

    pub manual_label: Option<Label>,
    pub manual_score: Option<u8>,
    pub tagged_by: Option<String>,
    pub tagged_at: Option<DateTime<Utc>>,

    pub ignored: bool,
    pub ignored_at: Option<DateTime<Utc>>,
    pub urgent: bool,
    pub num_comments: u32,
}

impl Mention {
    /// The label every consumer should display or aggregate on.
    #[must_use]
    pub fn effective_label(&self) -> Label {
        self.manual_label.unwrap_or(self.label)
    }

    #[must_use]
    pub fn effective_score(&self) -> u8 {
        self.manual_score.unwrap_or(self.score)
    }

    /// `true` once a human has corrected the label.
    #[must_use]
    pub fn is_tagged(&self) -> bool {
        self.manual_label.is_some()
    }

    /// Record a manual correction.
    pub fn tag(&mut self, label: Label, score: Option<u8>, tagged_by: &str, at: DateTime<Utc>) {
        self.manual_label = Some(label);
        self.manual_score = score.map(|s| s.clamp(1, 100));
        self.tagged_by = Some(tagged_by.to_string());
        self.tagged_at = Some(at);
    }

    pub fn set_ignored(&mut self, ignored: bool, at: DateTime<Utc>) {
        self.ignored = ignored;
        self.ignored_at = ignored.then_some(at);
    }
}
