//! Phrase matching of mention text against the weighted lexicon.

use std::collections::BTreeSet;

use snoowatch_core::{Lexicon, Polarity};

/// One lexicon entry found in the text.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub term: String,
    pub polarity: Polarity,
    pub weight: f64,
}

/// Every lexicon entry present in a text, with per-polarity weight totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSet {
    pub matches: Vec<KeywordMatch>,
    pub positive_weight: f64,
    pub negative_weight: f64,
    pub neutral_weight: f64,
}

impl MatchSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// `Σ weight · polarity`.
    #[must_use]
    pub fn net_weight(&self) -> f64 {
        self.positive_weight - self.negative_weight
    }

    /// `Σ weight`, neutral entries included.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.positive_weight + self.negative_weight + self.neutral_weight
    }

    #[must_use]
    pub fn terms(&self) -> BTreeSet<String> {
        self.matches.iter().map(|m| m.term.clone()).collect()
    }
}

/// Scans normalized text for lexicon phrases.
///
/// Matching is exact substring on lowercased text. Each entry counts at most
/// once per text, and overlapping entries ("not good" and "good") are each
/// counted on their own.
#[derive(Debug, Clone, Copy)]
pub struct KeywordMatcher<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> KeywordMatcher<'a> {
    #[must_use]
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    #[must_use]
    pub fn scan(&self, text: &str) -> MatchSet {
        let haystack = text.to_lowercase();
        let mut set = MatchSet::default();

        for entry in self.lexicon.entries() {
            if !haystack.contains(entry.term.as_str()) {
                continue;
            }
            match entry.polarity {
                Polarity::Positive => set.positive_weight += entry.weight,
                Polarity::Negative => set.negative_weight += entry.weight,
                Polarity::Neutral => set.neutral_weight += entry.weight,
            }
            set.matches.push(KeywordMatch {
                term: entry.term.clone(),
                polarity: entry.polarity,
                weight: entry.weight,
            });
        }

        set
    }
}

/// Title and body joined into the text the matcher sees.
///
/// A mention with neither yields an empty string, which simply matches nothing.
#[must_use]
pub fn mention_text(title: Option<&str>, body: Option<&str>) -> String {
    match (title, body) {
        (Some(t), Some(b)) => format!("{t}\n{b}"),
        (Some(t), None) => t.to_string(),
        (None, Some(b)) => b.to_string(),
        (None, None) => String::new(),
    }
}
