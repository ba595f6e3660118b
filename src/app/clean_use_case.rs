use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, info_span};

use crate::constants::{
    ARTIFACT_METHODS_COLUMN, ARTIFACT_METHODS_FILE, OUTCOME_KEYWORDS_COLUMN, OUTCOME_KEYWORDS_FILE,
    SPREADSHEET_DELIMITER, STEP_KEYWORDS_COLUMN, STEP_KEYWORDS_FILE,
};
use crate::pipeline::processing::citation::{disambiguate_table, Disambiguation};
use crate::pipeline::processing::expand::{write_entries, RowExpander};
use crate::pipeline::processing::normalize::{NormalizeReport, TextNormalizer};
use crate::table::Table;

/// Multi-valued columns written as long tables by the clean command
pub const CLEANED_OUTPUTS: [(&str, &str); 3] = [
    (ARTIFACT_METHODS_COLUMN, ARTIFACT_METHODS_FILE),
    (STEP_KEYWORDS_COLUMN, STEP_KEYWORDS_FILE),
    (OUTCOME_KEYWORDS_COLUMN, OUTCOME_KEYWORDS_FILE),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedOutput {
    pub column: String,
    pub path: PathBuf,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub normalize: NormalizeReport,
    pub disambiguation: Disambiguation,
    pub outputs: Vec<CleanedOutput>,
}

/// Spreadsheet export -> normalized, disambiguated, exploded long tables
pub struct CleanUseCase {
    normalizer: TextNormalizer,
    expander: RowExpander,
}

impl CleanUseCase {
    pub fn new(normalizer: TextNormalizer, expander: RowExpander) -> Self {
        Self { normalizer, expander }
    }

    /// Normalize and disambiguate a table already in memory.
    pub fn prepare(&self, table: &mut Table) -> (NormalizeReport, Disambiguation) {
        table.normalize_column_names();
        let normalize = self.normalizer.normalize(table);
        let disambiguation = disambiguate_table(table);
        (normalize, disambiguation)
    }

    pub fn run(&self, input: &Path, output_dir: &Path) -> Result<CleanReport> {
        let _span = info_span!("clean", input = %input.display()).entered();
        let mut table = Table::read_delimited(input, SPREADSHEET_DELIMITER)
            .with_context(|| format!("Failed to read spreadsheet {}", input.display()))?;
        let rows_read = table.len();

        let (normalize, disambiguation) = self.prepare(&mut table);

        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        let mut outputs = Vec::with_capacity(CLEANED_OUTPUTS.len());
        for (column, file) in CLEANED_OUTPUTS {
            let expansion = self
                .expander
                .expand(&table, column)
                .with_context(|| format!("Failed to expand column '{column}'"))?;
            let path = output_dir.join(file);
            write_entries(&path, &expansion)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            outputs.push(CleanedOutput { column: column.to_string(), path, entries: expansion.len() });
        }

        info!("Cleaned {} of {} rows into {} tables", table.len(), rows_read, outputs.len());
        Ok(CleanReport { rows_read, rows_kept: table.len(), normalize, disambiguation, outputs })
    }
}
