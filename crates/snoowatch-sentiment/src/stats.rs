//! Agreement between the automated classifier and human corrections.
//!
//! Always recomputed from a full scan; nothing here is kept between calls.

use std::collections::BTreeMap;

use serde::Serialize;
use snoowatch_core::Mention;

/// Counts for the mentions in which one keyword matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeywordAgreement {
    pub matched: usize,
    pub tagged: usize,
    pub agreed: usize,
}

impl KeywordAgreement {
    /// `agreed / tagged`, or `None` when nothing with this keyword was tagged.
    #[must_use]
    pub fn agreement(&self) -> Option<f64> {
        ratio(self.agreed, self.tagged)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningStats {
    pub total_mentions: usize,
    pub tagged_count: usize,
    pub agreed_count: usize,
    /// `None` when no mention carries a manual label.
    pub overall_agreement: Option<f64>,
    pub per_keyword_agreement: BTreeMap<String, Option<f64>>,
    pub per_keyword: BTreeMap<String, KeywordAgreement>,
}

impl LearningStats {
    /// Keywords whose tagged mentions disagree with the classifier most,
    /// lowest agreement first. Keywords with no tagged mentions are skipped.
    #[must_use]
    pub fn least_reliable_keywords(&self, limit: usize) -> Vec<(&str, f64)> {
        let mut rated: Vec<(&str, f64)> = self
            .per_keyword_agreement
            .iter()
            .filter_map(|(k, v)| v.map(|rate| (k.as_str(), rate)))
            .collect();
        rated.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        rated.truncate(limit);
        rated
    }
}

/// Scan `mentions` and compute a fresh snapshot.
#[must_use]
pub fn compute_learning_stats(mentions: &[Mention]) -> LearningStats {
    let mut tagged_count = 0;
    let mut agreed_count = 0;
    let mut per_keyword: BTreeMap<String, KeywordAgreement> = BTreeMap::new();

    for mention in mentions {
        let verdict = mention.manual_label.map(|manual| manual == mention.label);
        if let Some(agreed) = verdict {
            tagged_count += 1;
            if agreed {
                agreed_count += 1;
            }
        }

        for keyword in &mention.keywords_matched {
            let entry = per_keyword.entry(keyword.clone()).or_default();
            entry.matched += 1;
            if let Some(agreed) = verdict {
                entry.tagged += 1;
                if agreed {
                    entry.agreed += 1;
                }
            }
        }
    }

    let per_keyword_agreement = per_keyword
        .iter()
        .map(|(k, v)| (k.clone(), v.agreement()))
        .collect();

    LearningStats {
        total_mentions: mentions.len(),
        tagged_count,
        agreed_count,
        overall_agreement: ratio(agreed_count, tagged_count),
        per_keyword_agreement,
        per_keyword,
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let rate = numerator as f64 / denominator as f64;
    Some(rate)
}
