use serde::Serialize;
use std::collections::BTreeMap;

use super::expand::Expansion;

/// Ordered step keywords and declared outcomes of one study
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudyKeywords {
    pub citation: String,
    /// Pipeline order as written in the source cell
    pub steps: Vec<String>,
    pub outcomes: Vec<String>,
}

impl StudyKeywords {
    pub fn new<S: Into<String>>(citation: &str, steps: &[S], outcomes: &[S]) -> Self
    where
        S: Clone,
    {
        Self {
            citation: citation.to_string(),
            steps: steps.iter().cloned().map(Into::into).collect(),
            outcomes: outcomes.iter().cloned().map(Into::into).collect(),
        }
    }
}

/// Re-group exploded entries by citation, keeping each study's value order.
pub fn group_by_citation(expansion: &Expansion) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in &expansion.entries {
        grouped
            .entry(entry.citation.clone())
            .or_default()
            .push(entry.value.clone());
    }
    grouped
}

/// Outer-join step and outcome groupings on citation, ordered by citation.
///
/// A study that appears in only one of the two inputs gets an empty list for the other.
pub fn build_study_keywords(steps: &Expansion, outcomes: &Expansion) -> Vec<StudyKeywords> {
    let mut studies: BTreeMap<String, StudyKeywords> = BTreeMap::new();

    for (citation, values) in group_by_citation(steps) {
        studies
            .entry(citation.clone())
            .or_insert_with(|| StudyKeywords { citation, ..Default::default() })
            .steps = values;
    }
    for (citation, values) in group_by_citation(outcomes) {
        studies
            .entry(citation.clone())
            .or_insert_with(|| StudyKeywords { citation, ..Default::default() })
            .outcomes = values;
    }

    studies.into_values().collect()
}
