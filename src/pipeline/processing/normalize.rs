use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::constants::{CITATION_COLUMN, TITLE_COLUMN};
use crate::table::{Cell, Table};

/// Tokens that spreadsheet exports use for "no value"; compared case-insensitively.
pub const PLACEHOLDER_TOKENS: &[&str] = &["nan", "none", "null"];

/// Free-text columns cleaned by default.
pub const DEFAULT_TEXT_COLUMNS: &[&str] = &[
    "cohort",
    "gait_task",
    "dual_layer_cap",
    "type_of_eeg_electrodes",
    "gait_measurement_system",
    "artifactrej_methods",
    "step_keywords",
    "outcome_keywords_script",
];

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").unwrap());

/// Counts of what a normalization pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub cells_cleaned: usize,
    pub cells_nulled: usize,
    pub duplicate_rows_dropped: usize,
    pub empty_rows_dropped: usize,
    pub missing_identity_dropped: usize,
    /// Designated columns that were not present in the table
    pub skipped_columns: Vec<String>,
}

impl NormalizeReport {
    pub fn rows_dropped(&self) -> usize {
        self.duplicate_rows_dropped + self.empty_rows_dropped + self.missing_identity_dropped
    }

    pub fn is_noop(&self) -> bool {
        self.cells_cleaned == 0 && self.cells_nulled == 0 && self.rows_dropped() == 0
    }
}

/// True for empty/whitespace-only cells and placeholder tokens such as `NaN` or `NULL`.
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || PLACEHOLDER_TOKENS
            .iter()
            .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Collapse line breaks to a single space and strip surrounding whitespace.
pub fn clean_text(value: &str) -> String {
    LINE_BREAKS.replace_all(value, " ").trim().to_string()
}

/// Cleans raw spreadsheet cells into canonical strings or nulls
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    text_columns: Vec<String>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_COLUMNS.iter().copied())
    }
}

impl TextNormalizer {
    pub fn new<S: Into<String>>(text_columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            text_columns: text_columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn normalize(&self, table: &mut Table) -> NormalizeReport {
        let mut report = NormalizeReport::default();

        for name in &self.text_columns {
            let Some(col) = table.resolve_column(name, &[]) else {
                debug!("Text column '{}' not present, skipping", name);
                report.skipped_columns.push(name.clone());
                continue;
            };
            for row in table.rows_mut() {
                if let Some(value) = row[col].as_mut() {
                    let cleaned = clean_text(value);
                    if cleaned != *value {
                        *value = cleaned;
                        report.cells_cleaned += 1;
                    }
                }
            }
        }

        // Placeholders are nulled table-wide, not only in the designated columns
        for row in table.rows_mut() {
            for cell in row.iter_mut() {
                if cell.as_deref().is_some_and(is_placeholder) {
                    *cell = None;
                    report.cells_nulled += 1;
                }
            }
        }

        let mut seen: HashSet<Vec<Cell>> = HashSet::new();
        report.duplicate_rows_dropped = table.retain_rows(|row| seen.insert(row.to_vec()));
        report.empty_rows_dropped = table.retain_rows(|row| row.iter().any(Option::is_some));

        if let (Some(title), Some(citation)) = (
            table.resolve_column(TITLE_COLUMN, &[]),
            table.resolve_column(CITATION_COLUMN, &[]),
        ) {
            report.missing_identity_dropped = table.retain_rows(|row| {
                let keep = row[title].is_some() && row[citation].is_some();
                if !keep {
                    debug!(
                        "Dropping row without title/citation: title={:?} citation={:?}",
                        row[title], row[citation]
                    );
                }
                keep
            });
            if report.missing_identity_dropped > 0 {
                warn!(
                    "Dropped {} rows lacking a title or citation",
                    report.missing_identity_dropped
                );
            }
        }

        info!(
            "Normalized table: {} cells cleaned, {} nulled, {} rows dropped, {} rows remain",
            report.cells_cleaned,
            report.cells_nulled,
            report.rows_dropped(),
            table.len()
        );
        report
    }
}
