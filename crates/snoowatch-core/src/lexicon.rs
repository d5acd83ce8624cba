//! Weighted keyword lexicon and the classifier policy constants that ship with it.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Direction a keyword pushes the score in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Polarity {
    Negative,
    Neutral,
    Positive,
}

impl TryFrom<i8> for Polarity {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Polarity::Negative),
            0 => Ok(Polarity::Neutral),
            1 => Ok(Polarity::Positive),
            other => Err(format!("polarity must be -1, 0 or 1, got {other}")),
        }
    }
}

impl From<Polarity> for i8 {
    fn from(value: Polarity) -> Self {
        match value {
            Polarity::Negative => -1,
            Polarity::Neutral => 0,
            Polarity::Positive => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconEntry {
    /// Keyword or phrase. Lowercased and trimmed once the lexicon is built.
    pub term: String,
    pub polarity: Polarity,
    /// Strictly positive contribution to the match weight.
    pub weight: f64,
}

impl LexiconEntry {
    #[must_use]
    pub fn new(term: &str, polarity: Polarity, weight: f64) -> Self {
        Self {
            term: term.to_string(),
            polarity,
            weight,
        }
    }
}

/// Thresholds and constants used by the classifier and run summary.
///
/// Scores strictly below `negative_below` are negative, strictly above
/// `positive_above` are positive, everything in between is neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierPolicy {
    pub negative_below: u8,
    pub positive_above: u8,
    /// Total matched weight at which confidence reaches 1.0.
    pub confidence_saturation: f64,
    /// Mentions scoring strictly below this land in a run's `top_negative` list.
    pub top_negative_below: u8,
    pub top_negative_limit: usize,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            negative_below: 40,
            positive_above: 60,
            confidence_saturation: 10.0,
            top_negative_below: 30,
            top_negative_limit: 10,
        }
    }
}

impl ClassifierPolicy {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.negative_below < 1
            || self.positive_above > 100
            || self.negative_below > self.positive_above
        {
            return Err(ConfigError::Validation(format!(
                "thresholds must satisfy 1 <= negative_below ({}) <= positive_above ({}) <= 100",
                self.negative_below, self.positive_above
            )));
        }
        if !self.confidence_saturation.is_finite() || self.confidence_saturation <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "confidence_saturation must be a positive number, got {}",
                self.confidence_saturation
            )));
        }
        Ok(())
    }
}

/// A validated, case-normalized keyword lexicon.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
    policy: ClassifierPolicy,
}

impl Lexicon {
    /// Build a lexicon, normalizing terms and validating weights and policy.
    ///
    /// An empty entry list is allowed here; the ingestion run is what refuses it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] on blank or duplicate terms,
    /// non-positive weights, or inconsistent policy thresholds.
    pub fn new(entries: Vec<LexiconEntry>, policy: ClassifierPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(entries.len());
        for entry in entries {
            let term = entry.term.trim().to_lowercase();
            if term.is_empty() {
                return Err(ConfigError::Validation(
                    "lexicon term must be non-empty".to_string(),
                ));
            }
            if !entry.weight.is_finite() || entry.weight <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "term '{term}' has invalid weight {}; must be > 0",
                    entry.weight
                )));
            }
            if !seen.insert(term.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate lexicon term: '{term}'"
                )));
            }
            normalized.push(LexiconEntry { term, ..entry });
        }

        Ok(Self {
            entries: normalized,
            policy,
        })
    }

    #[must_use]
    pub fn entries(&self) -> &[LexiconEntry] {
        &self.entries
    }

    #[must_use]
    pub fn policy(&self) -> &ClassifierPolicy {
        &self.policy
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate the normalized terms in file order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.term.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    #[serde(default)]
    keywords: Vec<LexiconEntry>,
    #[serde(default)]
    policy: ClassifierPolicy,
}

/// Load and validate a lexicon from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_lexicon(path: &Path) -> Result<Lexicon, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LexiconFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_lexicon(&content)
}

/// Parse and validate a lexicon from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_lexicon(yaml: &str) -> Result<Lexicon, ConfigError> {
    let file: LexiconFile = serde_yaml::from_str(yaml)?;
    Lexicon::new(file.keywords, file.policy)
}

#[cfg(test)]
#[path = "lexicon_test.rs"]
mod tests;
