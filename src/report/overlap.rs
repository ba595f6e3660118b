use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::constants::CITATION_COLUMN;
use crate::pipeline::processing::aggregate::{CorpusCounts, PairCount};
use crate::pipeline::processing::expand::Expansion;
use crate::pipeline::processing::sequence::{group_by_citation, StudyKeywords};
use crate::table::Table;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]{4})").unwrap());

/// First four-digit run in a citation, e.g. `Smith et al. 2021` -> 2021.
pub fn publication_year(citation: &str) -> Option<u16> {
    YEAR_RE
        .captures(citation)
        .and_then(|c| c[1].parse().ok())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySteps {
    pub citation: String,
    pub year: Option<u16>,
    pub steps: BTreeSet<String>,
}

/// Study x step indicator matrix ordered by publication year
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlapMatrix {
    /// Every distinct step, sorted
    pub steps: Vec<String>,
    /// Studies by ascending year; undated studies last
    pub studies: Vec<StudySteps>,
    counts: CorpusCounts,
}

impl OverlapMatrix {
    pub fn from_expansion(expansion: &Expansion) -> Self {
        let grouped = group_by_citation(expansion);

        let counts = CorpusCounts::from_studies(
            grouped
                .iter()
                .map(|(citation, steps)| StudyKeywords::new(citation, steps, &[]))
                .collect::<Vec<_>>()
                .iter(),
        );

        let mut studies: Vec<StudySteps> = grouped
            .into_iter()
            .map(|(citation, steps)| StudySteps {
                year: publication_year(&citation),
                steps: steps.into_iter().collect(),
                citation,
            })
            .collect();
        studies.sort_by_key(|s| (s.year.is_none(), s.year));

        let steps: BTreeSet<String> = studies.iter().flat_map(|s| s.steps.iter().cloned()).collect();

        Self { steps: steps.into_iter().collect(), studies, counts }
    }

    pub fn counts(&self) -> &CorpusCounts {
        &self.counts
    }

    /// Most frequent co-occurring step pairs with their share of studies.
    pub fn top_pairs(&self, n: usize) -> Vec<PairCount> {
        self.counts.cooccurrence_counts(Some(n))
    }

    /// `citation, year, <step>...` with `true`/`false` indicators.
    pub fn to_table(&self) -> Table {
        let header = [CITATION_COLUMN.to_string(), "year".to_string()]
            .into_iter()
            .chain(self.steps.iter().cloned());
        let mut table = Table::new(header);
        for study in &self.studies {
            let cells = [Some(study.citation.clone()), study.year.map(|y| y.to_string())]
                .into_iter()
                .chain(self.steps.iter().map(|s| Some(study.steps.contains(s).to_string())))
                .collect();
            table.push_row(cells);
        }
        table
    }
}
