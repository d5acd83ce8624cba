//! Lexicon-weighted score, label and confidence.

use snoowatch_core::{ClassifierPolicy, Label};

use crate::matcher::MatchSet;
use crate::types::Classification;

const MIDPOINT: f64 = 50.0;
const SPREAD: f64 = 49.0;

/// Pure, deterministic classifier over a [`MatchSet`].
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    policy: ClassifierPolicy,
}

impl Classifier {
    #[must_use]
    pub fn new(policy: ClassifierPolicy) -> Self {
        Self { policy }
    }

    /// `score = clamp(round(50 - 49 · net / max(total, 1)), 1, 100)`,
    /// `confidence = min(1, total / saturation)`.
    ///
    /// No matches gives score 50, neutral, confidence 0.
    #[must_use]
    pub fn classify(&self, matches: &MatchSet) -> Classification {
        let total = matches.total_weight();
        let ratio = matches.net_weight() / total.max(1.0);
        let score = to_score(MIDPOINT - SPREAD * ratio);

        let confidence = (total / self.policy.confidence_saturation).clamp(0.0, 1.0);

        Classification {
            label: label_for_score(score, &self.policy),
            score,
            confidence,
            keywords_matched: matches.terms(),
        }
    }
}

/// Map a score onto the three bands. Boundary scores are neutral.
#[must_use]
pub fn label_for_score(score: u8, policy: &ClassifierPolicy) -> Label {
    if score < policy.negative_below {
        Label::Negative
    } else if score > policy.positive_above {
        Label::Positive
    } else {
        Label::Neutral
    }
}

fn to_score(raw: f64) -> u8 {
    let rounded = raw.round().clamp(1.0, 100.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = rounded as u8;
    score
}

#[cfg(test)]
mod tests {
    use snoowatch_core::{Lexicon, LexiconEntry, Polarity};

    use super::*;
    use crate::matcher::KeywordMatcher;

    fn classify(lexicon: &Lexicon, text: &str) -> Classification {
        let set = KeywordMatcher::new(lexicon).scan(text);
        Classifier::new(*lexicon.policy()).classify(&set)
    }

    fn scenario_lexicon() -> Lexicon {
        Lexicon::new(
            vec![
                LexiconEntry::new("terrible", Polarity::Negative, 5.0),
                LexiconEntry::new("love", Polarity::Positive, 3.0),
            ],
            ClassifierPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn zero_matches_is_neutral_midpoint_with_no_confidence() {
        let c = classify(&scenario_lexicon(), "nothing relevant here");
        assert_eq!(c.score, 50);
        assert_eq!(c.label, Label::Neutral);
        assert!(c.confidence.abs() < f64::EPSILON);
        assert!(c.keywords_matched.is_empty());
    }

    #[test]
    fn mixed_scenario_reproduces_exact_score() {
        // net = -5 + 3 = -2, total = 8 → round(50 - 49 · -0.25) = round(62.25) = 62
        let c = classify(&scenario_lexicon(), "terrible service, I love the food");
        assert_eq!(c.score, 62);
        assert_eq!(c.label, Label::Positive);
        assert!((c.confidence - 0.8).abs() < 1e-9);
        assert_eq!(
            c.keywords_matched.into_iter().collect::<Vec<_>>(),
            vec!["love", "terrible"]
        );
    }

    #[test]
    fn single_polarity_reaches_the_range_ends() {
        let lex = scenario_lexicon();
        assert_eq!(classify(&lex, "terrible").score, 99);
        assert_eq!(classify(&lex, "love it").score, 1);
    }

    #[test]
    fn small_total_weight_is_normalized_by_one() {
        let lex = Lexicon::new(
            vec![LexiconEntry::new("meh", Polarity::Positive, 0.5)],
            ClassifierPolicy::default(),
        )
        .unwrap();
        // ratio = 0.5 / max(0.5, 1) = 0.5 → 50 - 24.5 = 25.5 → 26
        let c = classify(&lex, "meh");
        assert_eq!(c.score, 26);
        assert_eq!(c.label, Label::Negative);
    }

    #[test]
    fn confidence_saturates_at_one() {
        let lex = Lexicon::new(
            vec![
                LexiconEntry::new("awful", Polarity::Negative, 8.0),
                LexiconEntry::new("broken", Polarity::Negative, 8.0),
            ],
            ClassifierPolicy::default(),
        )
        .unwrap();
        let c = classify(&lex, "awful and broken");
        assert!((c.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_grows_with_matched_weight() {
        let lex = scenario_lexicon();
        let one = classify(&lex, "love");
        let two = classify(&lex, "love, terrible");
        assert!(two.confidence > one.confidence);
    }

    #[test]
    fn boundary_scores_are_neutral() {
        let policy = ClassifierPolicy::default();
        assert_eq!(label_for_score(39, &policy), Label::Negative);
        assert_eq!(label_for_score(40, &policy), Label::Neutral);
        assert_eq!(label_for_score(60, &policy), Label::Neutral);
        assert_eq!(label_for_score(61, &policy), Label::Positive);
    }

    #[test]
    fn every_score_is_in_range_and_consistent_with_its_label() {
        let lex = Lexicon::new(
            vec![
                LexiconEntry::new("a", Polarity::Negative, 1.0),
                LexiconEntry::new("b", Polarity::Positive, 2.5),
                LexiconEntry::new("c", Polarity::Neutral, 0.25),
                LexiconEntry::new("d", Polarity::Negative, 7.0),
            ],
            ClassifierPolicy::default(),
        )
        .unwrap();
        let policy = *lex.policy();
        for text in ["", "a", "b", "c", "d", "ab", "bc", "abcd", "bd", "cd", "acd"] {
            let c = classify(&lex, text);
            assert!((1..=100).contains(&c.score), "{text}: {}", c.score);
            assert!((0.0..=1.0).contains(&c.confidence));
            assert_eq!(c.label, label_for_score(c.score, &policy), "{text}");
        }
    }

    #[test]
    fn classification_is_deterministic() {
        let lex = scenario_lexicon();
        let text = "terrible service, I love the food";
        assert_eq!(classify(&lex, text), classify(&lex, text));
    }

    #[test]
    fn shipped_lexicon_scores_run_opposite_to_keyword_polarity() {
        let shipped =
            snoowatch_core::parse_lexicon(include_str!("../../../config/lexicon.yaml")).unwrap();

        let complaint = classify(&shipped, "total scam");
        assert_eq!(complaint.score, 99);
        assert_eq!(complaint.label, Label::Positive);

        let praise = classify(&shipped, "love it, would recommend");
        assert_eq!(praise.score, 1);
        assert_eq!(praise.label, Label::Negative);
        assert!(praise.score < shipped.policy().top_negative_below);
    }
}
