//! Corpus-wide keyword statistics: per-study frequency, ordered adjacent
//! transitions (including last step -> outcome), and unordered co-occurrence.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::sequence::StudyKeywords;

/// Ordered for transitions, canonical (a < b) for co-occurrence
pub type Pair = (String, String);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusCounts {
    pub studies: usize,
    /// Number of studies listing each step keyword at least once
    pub frequency: BTreeMap<String, usize>,
    /// Number of studies declaring each outcome keyword at least once
    pub outcome_frequency: BTreeMap<String, usize>,
    pub transitions: BTreeMap<Pair, usize>,
    pub cooccurrence: BTreeMap<Pair, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairCount {
    pub from: String,
    pub to: String,
    pub count: usize,
    pub percent: f64,
}

/// Serializable view of [`CorpusCounts`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountsSummary {
    pub studies: usize,
    pub steps: Vec<KeywordCount>,
    pub outcomes: Vec<KeywordCount>,
    pub transitions: Vec<PairCount>,
    pub cooccurrence: Vec<PairCount>,
}

pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Entries sorted by count descending, then key ascending; `n = None` keeps all.
pub fn most_common<K: Clone + Ord>(counts: &BTreeMap<K, usize>, n: Option<usize>) -> Vec<(K, usize)> {
    let mut sorted: Vec<(K, usize)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    // BTreeMap iteration is key-ordered and the sort is stable
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some(n) = n {
        sorted.truncate(n);
    }
    sorted
}

impl CorpusCounts {
    pub fn from_studies<'a>(studies: impl IntoIterator<Item = &'a StudyKeywords>) -> Self {
        let mut counts = Self::default();
        for study in studies {
            counts.add_study(study);
        }
        counts
    }

    pub fn add_study(&mut self, study: &StudyKeywords) {
        self.studies += 1;

        let distinct_steps: BTreeSet<&str> = study.steps.iter().map(String::as_str).collect();
        for step in &distinct_steps {
            *self.frequency.entry(step.to_string()).or_default() += 1;
        }
        let distinct_outcomes: BTreeSet<&str> = study.outcomes.iter().map(String::as_str).collect();
        for outcome in distinct_outcomes {
            *self.outcome_frequency.entry(outcome.to_string()).or_default() += 1;
        }

        for window in study.steps.windows(2) {
            *self
                .transitions
                .entry((window[0].clone(), window[1].clone()))
                .or_default() += 1;
        }
        // The pipeline terminates by producing each declared outcome
        if let Some(last) = study.steps.last() {
            for outcome in &study.outcomes {
                *self
                    .transitions
                    .entry((last.clone(), outcome.clone()))
                    .or_default() += 1;
            }
        }

        // Sorted distinct keywords, so only (a, b) with a < b is ever produced
        let keywords: Vec<&str> = distinct_steps.into_iter().collect();
        for (i, a) in keywords.iter().enumerate() {
            for b in &keywords[i + 1..] {
                *self
                    .cooccurrence
                    .entry((a.to_string(), b.to_string()))
                    .or_default() += 1;
            }
        }
    }

    pub fn total_transitions(&self) -> usize {
        self.transitions.values().sum()
    }

    pub fn step_counts(&self, n: Option<usize>) -> Vec<KeywordCount> {
        keyword_counts(&self.frequency, self.studies, n)
    }

    pub fn outcome_counts(&self, n: Option<usize>) -> Vec<KeywordCount> {
        keyword_counts(&self.outcome_frequency, self.studies, n)
    }

    /// Transitions with their share of all transitions.
    pub fn transition_counts(&self, n: Option<usize>) -> Vec<PairCount> {
        pair_counts(&self.transitions, self.total_transitions(), n)
    }

    /// Co-occurring pairs with their share of studies.
    pub fn cooccurrence_counts(&self, n: Option<usize>) -> Vec<PairCount> {
        pair_counts(&self.cooccurrence, self.studies, n)
    }

    pub fn summary(&self) -> CountsSummary {
        CountsSummary {
            studies: self.studies,
            steps: self.step_counts(None),
            outcomes: self.outcome_counts(None),
            transitions: self.transition_counts(None),
            cooccurrence: self.cooccurrence_counts(None),
        }
    }
}

fn keyword_counts(counts: &BTreeMap<String, usize>, total: usize, n: Option<usize>) -> Vec<KeywordCount> {
    most_common(counts, n)
        .into_iter()
        .map(|(keyword, count)| KeywordCount { keyword, count, percent: percent(count, total) })
        .collect()
}

fn pair_counts(counts: &BTreeMap<Pair, usize>, total: usize, n: Option<usize>) -> Vec<PairCount> {
    most_common(counts, n)
        .into_iter()
        .map(|((from, to), count)| PairCount { from, to, count, percent: percent(count, total) })
        .collect()
}
