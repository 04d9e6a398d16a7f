// Representative Quote Selection
// Deterministic ranking: length window, key term, then input order

use super::classifier::ClassifiedReview;
use crate::services::config_store::AnalysisConfig;
use crate::services::text_processor::display_quote;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotePolicy {
    pub min_chars: usize,
    pub max_chars: usize,
    pub cap: usize,
}

impl QuotePolicy {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            min_chars: config.quote_min_chars,
            max_chars: config.quote_max_chars.max(config.quote_min_chars),
            cap: config.quote_cap,
        }
    }

    fn in_window(&self, len: usize) -> bool {
        len >= self.min_chars && len <= self.max_chars
    }
}

/// Rank candidate quotes from `members`, best first, distinct texts only.
/// Returns one more than `policy.cap` so a caller can swap the lead quote.
pub fn rank_quotes(
    members: &[&ClassifiedReview<'_>],
    key_term: Option<&str>,
    policy: &QuotePolicy,
) -> Vec<String> {
    if policy.cap == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(bool, bool, usize, String)> = members
        .iter()
        .filter_map(|c| {
            let quote = display_quote(&c.review.body);
            if quote.is_empty() {
                return None;
            }
            let in_window = policy.in_window(quote.chars().count());
            let has_key = key_term.is_some_and(|k| c.normalized.contains(k));
            Some((!in_window, !has_key, c.index, quote))
        })
        .collect();
    candidates.sort();

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(|(_, _, _, quote)| quote)
        .filter(|q| seen.insert(q.clone()))
        .take(policy.cap + 1)
        .collect()
}

/// Tracks which quotes already lead a category within one collection.
#[derive(Debug, Default)]
pub struct QuoteLedger {
    leading: HashSet<String>,
}

impl QuoteLedger {
    /// Pick the final quotes for one category. A quote that already leads
    /// another category is moved out of first place when an alternative exists.
    pub fn assign(&mut self, mut ranked: Vec<String>, cap: usize) -> Vec<String> {
        if let Some(pos) = ranked.iter().position(|q| !self.leading.contains(q)) {
            if pos > 0 {
                let fresh = ranked.remove(pos);
                ranked.insert(0, fresh);
            }
        }
        ranked.truncate(cap);
        if let Some(first) = ranked.first() {
            self.leading.insert(first.clone());
        }
        ranked
    }
}
