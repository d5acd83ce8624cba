//! Reddit listing helpers: query building, term filtering, and record conversion.

use std::collections::HashSet;

use serde::Deserialize;

use crate::types::RawCandidate;

/// Reddit listing wrapper.
#[derive(Debug, Deserialize)]
pub(super) struct Listing {
    pub(super) data: ListingData,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListingData {
    #[serde(default)]
    pub(super) children: Vec<Thing>,
    pub(super) after: Option<String>,
}

/// One listing child. `kind` is `t3` for posts and `t1` for comments.
#[derive(Debug, Deserialize)]
pub(super) struct Thing {
    #[serde(default)]
    pub(super) kind: String,
    #[serde(default)]
    pub(super) data: ThingData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ThingData {
    pub(super) name: Option<String>,
    pub(super) subreddit: Option<String>,
    pub(super) permalink: Option<String>,
    pub(super) author: Option<String>,
    pub(super) title: Option<String>,
    pub(super) selftext: Option<String>,
    pub(super) body: Option<String>,
    pub(super) created_utc: Option<f64>,
    pub(super) num_comments: Option<i64>,
}

/// OR-join search terms, quoting multi-word phrases.
pub(super) fn build_search_query(terms: &[String]) -> String {
    let mut seen = HashSet::new();
    terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .map(|t| {
            if t.contains(char::is_whitespace) {
                format!("\"{t}\"")
            } else {
                t.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Case-insensitive check that `text` contains at least one search term.
pub(super) fn mentions_any_term(text: &str, terms: &[String]) -> bool {
    let haystack = text.to_lowercase();
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .any(|t| !t.is_empty() && haystack.contains(&t))
}

/// Convert a listing child into an unvalidated candidate.
///
/// Deleted or removed text and authors are dropped, everything else is passed
/// through as-is so validation can report what is missing.
pub(super) fn to_raw_candidate(thing: Thing) -> RawCandidate {
    let kind = match thing.kind.as_str() {
        "t3" => Some("post".to_string()),
        "t1" => Some("comment".to_string()),
        "" => None,
        other => Some(other.to_string()),
    };
    let data = thing.data;
    let body = if thing.kind == "t1" {
        data.body
    } else {
        data.selftext
    };

    RawCandidate {
        id: data.name,
        kind,
        subreddit: data.subreddit,
        permalink: data.permalink,
        author: data.author.filter(|a| !is_tombstone(a)),
        title: data.title,
        body: body.filter(|b| !is_tombstone(b)),
        created_utc: data.created_utc,
        num_comments: data.num_comments,
    }
}

/// Text of a listing child, for term filtering.
pub(super) fn thing_text(thing: &Thing) -> String {
    let parts = [
        thing.data.title.as_deref(),
        thing.data.selftext.as_deref(),
        thing.data.body.as_deref(),
    ];
    parts.into_iter().flatten().collect::<Vec<_>>().join(" ")
}

fn is_tombstone(value: &str) -> bool {
    matches!(value.trim(), "[deleted]" | "[removed]")
}
