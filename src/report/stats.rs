use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::warn;

use crate::constants::{
    CITATION_COLUMN, COHORT_COLUMN, EEG_ELECTRODES_COLUMN, GAIT_SYSTEM_COLUMN, GAIT_TASK_COLUMN,
};
use crate::error::{Result, ReviewError};
use crate::pipeline::processing::aggregate::{most_common, percent};
use crate::pipeline::processing::expand::Expansion;
use crate::table::Table;

/// Label used for artifact entries whose citation was empty
pub const UNKNOWN_STUDY: &str = "Unknown Study";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    pub percent: f64,
}

/// Occurrences of each value with its share of all values, most common first.
pub fn value_counts<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<ValueCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0;
    for value in values {
        *counts.entry(value.to_string()).or_default() += 1;
        total += 1;
    }
    most_common(&counts, None)
        .into_iter()
        .map(|(value, count)| ValueCount { value, count, percent: percent(count, total) })
        .collect()
}

/// Two-way frequency table with row-wise percentages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossTab {
    pub row_label: String,
    pub column_label: String,
    counts: BTreeMap<(String, String), usize>,
    rows: BTreeSet<String>,
    columns: BTreeSet<String>,
}

impl CrossTab {
    pub fn new(row_label: &str, column_label: &str) -> Self {
        Self {
            row_label: row_label.to_string(),
            column_label: column_label.to_string(),
            ..Default::default()
        }
    }

    pub fn add(&mut self, row: &str, column: &str) {
        self.rows.insert(row.to_string());
        self.columns.insert(column.to_string());
        *self.counts.entry((row.to_string(), column.to_string())).or_default() += 1;
    }

    pub fn rows(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn get(&self, row: &str, column: &str) -> usize {
        self.counts
            .get(&(row.to_string(), column.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn row_total(&self, row: &str) -> usize {
        self.columns.iter().map(|c| self.get(row, c)).sum()
    }

    pub fn row_percent(&self, row: &str, column: &str) -> f64 {
        percent(self.get(row, column), self.row_total(row))
    }

    /// Counts as a table: one row per row label, zeros filled in.
    pub fn to_table(&self) -> Table {
        let header = std::iter::once(self.row_label.clone()).chain(self.columns.iter().cloned());
        let mut table = Table::new(header);
        for row in &self.rows {
            let cells = std::iter::once(Some(row.clone()))
                .chain(self.columns.iter().map(|c| Some(self.get(row, c).to_string())))
                .collect();
            table.push_row(cells);
        }
        table
    }
}

impl fmt::Display for CrossTab {
    /// `count (row%)` per cell, one line per row label.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} \\ {}", self.row_label, self.column_label)?;
        for row in &self.rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| format!("{}: {} ({:.1}%)", c, self.get(row, c), self.row_percent(row, c)))
                .collect();
            writeln!(f, "  {}: {}", row, cells.join(", "))?;
        }
        Ok(())
    }
}

/// Studies per cohort and gait task, counting rows with a citation.
pub fn cohort_task_crosstab(table: &Table) -> Result<CrossTab> {
    let required = [COHORT_COLUMN, GAIT_TASK_COLUMN, CITATION_COLUMN];
    let indices: Vec<Option<usize>> = required.iter().map(|c| table.resolve_column(c, &[])).collect();
    let missing: Vec<&str> = required
        .iter()
        .zip(&indices)
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| *name)
        .collect();
    let [Some(cohort), Some(task), Some(citation)] = indices[..] else {
        return Err(ReviewError::missing_columns(missing));
    };

    let mut crosstab = CrossTab::new(COHORT_COLUMN, GAIT_TASK_COLUMN);
    for row in 0..table.len() {
        if let (Some(c), Some(t), Some(_)) =
            (table.get(row, cohort), table.get(row, task), table.get(row, citation))
        {
            crosstab.add(c.trim(), t.trim());
        }
    }
    Ok(crosstab)
}

fn semicolon_values(cell: Option<&str>) -> Vec<&str> {
    cell.map(|c| c.split(';').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// Per-row Cartesian product of electrode types and gait measurement systems.
///
/// A missing column contributes no values, so the result is empty.
pub fn electrode_gait_pairs(table: &Table) -> Vec<(String, String)> {
    let eeg = table.resolve_column(EEG_ELECTRODES_COLUMN, &[]);
    let gait = table.resolve_column(GAIT_SYSTEM_COLUMN, &[]);
    for (name, idx) in [(EEG_ELECTRODES_COLUMN, eeg), (GAIT_SYSTEM_COLUMN, gait)] {
        if idx.is_none() {
            warn!("Column '{}' not found; no electrode/gait pairs", name);
        }
    }
    let (Some(eeg), Some(gait)) = (eeg, gait) else {
        return Vec::new();
    };

    let mut pairs = Vec::new();
    for row in 0..table.len() {
        let systems = semicolon_values(table.get(row, gait));
        for electrode in semicolon_values(table.get(row, eeg)) {
            for system in &systems {
                pairs.push((electrode.to_string(), system.to_string()));
            }
        }
    }
    pairs
}

pub fn electrode_gait_crosstab(pairs: &[(String, String)]) -> CrossTab {
    let mut crosstab = CrossTab::new(EEG_ELECTRODES_COLUMN, GAIT_SYSTEM_COLUMN);
    for (electrode, system) in pairs {
        crosstab.add(electrode, system);
    }
    crosstab
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactSummary {
    pub studies: usize,
    pub unique_methods: usize,
    pub top_methods: Vec<ValueCount>,
    pub average_methods_per_study: f64,
    pub multi_method_studies: usize,
}

fn study_label(citation: &str) -> &str {
    let citation = citation.trim();
    if citation.is_empty() {
        UNKNOWN_STUDY
    } else {
        citation
    }
}

/// Studies in first-appearance order with their distinct methods.
fn methods_by_study(expansion: &Expansion) -> Vec<(String, BTreeSet<String>)> {
    let mut order: Vec<(String, BTreeSet<String>)> = Vec::new();
    for entry in &expansion.entries {
        let label = study_label(&entry.citation);
        match order.iter_mut().find(|(c, _)| c == label) {
            Some((_, methods)) => {
                methods.insert(entry.value.clone());
            }
            None => order.push((label.to_string(), BTreeSet::from([entry.value.clone()]))),
        }
    }
    order
}

impl ArtifactSummary {
    pub fn from_expansion(expansion: &Expansion) -> Self {
        let studies = methods_by_study(expansion);
        let unique: BTreeSet<&str> = expansion.values().collect();
        let per_study: Vec<usize> = studies.iter().map(|(_, m)| m.len()).collect();
        let average = if per_study.is_empty() {
            0.0
        } else {
            per_study.iter().sum::<usize>() as f64 / per_study.len() as f64
        };
        let mut top_methods = value_counts(expansion.values());
        top_methods.truncate(10);

        Self {
            studies: studies.len(),
            unique_methods: unique.len(),
            top_methods,
            average_methods_per_study: average,
            multi_method_studies: per_study.iter().filter(|n| **n > 1).count(),
        }
    }
}

/// Study x method indicator table (`1`/`0`), studies and methods in first-appearance order.
pub fn artifact_matrix(expansion: &Expansion) -> Table {
    let mut methods: Vec<&str> = Vec::new();
    for value in expansion.values() {
        if !methods.contains(&value) {
            methods.push(value);
        }
    }
    let header = std::iter::once(CITATION_COLUMN.to_string()).chain(methods.iter().map(|m| m.to_string()));
    let mut table = Table::new(header);
    for (study, used) in methods_by_study(expansion) {
        let cells = std::iter::once(Some(study))
            .chain(methods.iter().map(|m| {
                Some(if used.contains(*m) { "1" } else { "0" }.to_string())
            }))
            .collect();
        table.push_row(cells);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::expand::ExpandedEntry;

    fn artifacts(rows: &[(&str, &str)]) -> Expansion {
        Expansion {
            column: "artifactrej_methods".to_string(),
            entries: rows
                .iter()
                .map(|(citation, value)| ExpandedEntry {
                    title: format!("About {citation}"),
                    citation: citation.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_value_counts_percent_of_all_values() {
        let counts = value_counts(["wet", "dry", "wet", "active"]);
        assert_eq!(counts[0], ValueCount { value: "wet".into(), count: 2, percent: 50.0 });
        // ties are ordered by value
        assert_eq!(counts[1].value, "active");
        assert_eq!(counts[2].value, "dry");
    }

    #[test]
    fn test_cohort_crosstab_requires_columns() {
        let table = Table::from_rows(["title", "cohort"], vec![vec!["A", "Healthy"]]);
        match cohort_task_crosstab(&table) {
            Err(ReviewError::MissingColumn { columns }) => {
                assert_eq!(columns, vec!["gait_task", "citation"])
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_cohort_crosstab_counts_cited_rows() {
        let table = Table::from_rows(
            ["citation", "cohort", "gait_task"],
            vec![
                vec!["S1", "Healthy", "Treadmill walking"],
                vec!["S2", "Healthy", "Treadmill walking"],
                vec!["S3", "Parkinson", "Overground walking"],
                vec!["", "Parkinson", "Overground walking"],
                vec!["S5", "", "Overground walking"],
            ],
        );
        let crosstab = cohort_task_crosstab(&table).unwrap();
        assert_eq!(crosstab.get("Healthy", "Treadmill walking"), 2);
        assert_eq!(crosstab.get("Parkinson", "Overground walking"), 1);
        assert_eq!(crosstab.get("Healthy", "Overground walking"), 0);

        let out = crosstab.to_table();
        assert_eq!(out.columns(), ["cohort", "Overground walking", "Treadmill walking"]);
        assert_eq!(out.get(0, 0), Some("Healthy"));
        assert_eq!(out.get(0, 2), Some("2"));
    }

    #[test]
    fn test_electrode_pairs_are_cartesian_per_row() {
        let table = Table::from_rows(
            ["type_of_eeg_electrodes", "gait_measurement_system"],
            vec![
                vec!["Wet; Dry", "IMU;Force plate"],
                vec!["Active", ""],
                vec!["Wet", "IMU"],
            ],
        );
        let pairs = electrode_gait_pairs(&table);
        assert_eq!(pairs.len(), 5);
        let crosstab = electrode_gait_crosstab(&pairs);
        assert_eq!(crosstab.get("Wet", "IMU"), 2);
        assert_eq!(crosstab.row_total("Wet"), 3);
        assert!((crosstab.row_percent("Wet", "IMU") - 66.666).abs() < 0.01);
        assert!(crosstab.rows().all(|r| r != "Active"));
    }

    #[test]
    fn test_artifact_summary() {
        let expansion = artifacts(&[
            ("Smith2020", "ASR"),
            ("Smith2020", "ICA"),
            ("Doe2021", "ASR"),
            ("Doe2021", "ASR"),
            ("", "Manual"),
        ]);
        let summary = ArtifactSummary::from_expansion(&expansion);
        assert_eq!(summary.studies, 3);
        assert_eq!(summary.unique_methods, 3);
        assert_eq!(summary.top_methods[0].value, "ASR");
        assert_eq!(summary.top_methods[0].count, 3);
        assert_eq!(summary.multi_method_studies, 1);
        assert!((summary.average_methods_per_study - 4.0 / 3.0).abs() < 1e-9);

        let matrix = artifact_matrix(&expansion);
        assert_eq!(matrix.columns(), ["citation", "ASR", "ICA", "Manual"]);
        assert_eq!(matrix.get(1, 0), Some("Doe2021"));
        assert_eq!(matrix.get(1, 2), Some("0"));
        assert_eq!(matrix.get(2, 0), Some(UNKNOWN_STUDY));
        assert_eq!(matrix.get(2, 3), Some("1"));
    }
}
