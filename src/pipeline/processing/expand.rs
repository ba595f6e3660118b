use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::constants::{alternate_column_names, CITATION_COLUMN, TITLE_COLUMN};
use crate::error::{Result, ReviewError};
use crate::table::Table;

static LIST_ARTIFACTS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\[\]'"]"#).unwrap());
static SEMICOLON_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"[;,]\s*").unwrap());
static SEMICOLON_COMMA_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"[;,/]\s*").unwrap());

/// Whether `/` separates values in a multi-valued cell.
///
/// Spreadsheet revisions disagree: `ERD/ERS` is one outcome keyword in the stage
/// table, but some free-text columns use `/` between alternatives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Split on `;` and `,` only; `ERD/ERS` stays one value
    #[default]
    PreserveSlash,
    /// Split on `;`, `,` and `/`
    SplitSlash,
}

impl SplitPolicy {
    fn delimiter(&self) -> &'static Regex {
        match self {
            SplitPolicy::PreserveSlash => &SEMICOLON_COMMA,
            SplitPolicy::SplitSlash => &SEMICOLON_COMMA_SLASH,
        }
    }
}

/// One value of a multi-valued cell, tagged with the study it came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpandedEntry {
    pub title: String,
    pub citation: String,
    pub value: String,
}

/// Long-format result of exploding one column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub column: String,
    pub entries: Vec<ExpandedEntry>,
}

impl Expansion {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.value.as_str())
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new([TITLE_COLUMN, CITATION_COLUMN, self.column.as_str()]);
        for entry in &self.entries {
            table.push_row(vec![
                Some(entry.title.clone()),
                Some(entry.citation.clone()),
                Some(entry.value.clone()),
            ]);
        }
        table
    }
}

/// Split a list-like cell into trimmed, non-empty fragments in their original order.
///
/// Brackets and quotes are stripped first, so `['ICA', 'Epoching']` and
/// `ICA; Epoching` yield the same fragments.
pub fn split_cell(cell: &str, policy: SplitPolicy) -> Vec<String> {
    let cleaned = LIST_ARTIFACTS.replace_all(cell, "");
    policy
        .delimiter()
        .split(&cleaned)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Explodes a multi-valued column into one row per value
#[derive(Debug, Clone, Copy, Default)]
pub struct RowExpander {
    policy: SplitPolicy,
}

impl RowExpander {
    pub fn new(policy: SplitPolicy) -> Self {
        Self { policy }
    }

    /// Explode `column` of `table`.
    ///
    /// Fails when `title` or `citation` is missing. A missing target column is
    /// logged and yields an empty expansion so callers can sweep optional columns.
    pub fn expand(&self, table: &Table, column: &str) -> Result<Expansion> {
        let title = table.resolve_column(TITLE_COLUMN, &[]);
        let citation = table.resolve_column(CITATION_COLUMN, &[]);
        let (title, citation) = match (title, citation) {
            (Some(t), Some(c)) => (t, c),
            (t, c) => {
                let missing = [(TITLE_COLUMN, t), (CITATION_COLUMN, c)]
                    .into_iter()
                    .filter(|(_, idx)| idx.is_none())
                    .map(|(name, _)| name);
                return Err(ReviewError::missing_columns(missing));
            }
        };

        let mut expansion = Expansion {
            column: column.to_string(),
            entries: Vec::new(),
        };
        let Some(target) = table.resolve_column(column, alternate_column_names(column)) else {
            warn!("Column '{}' not found; returning no entries", column);
            return Ok(expansion);
        };
        if table.columns()[target] != column {
            debug!("Column '{}' resolved as '{}'", column, table.columns()[target]);
        }

        for (i, row) in table.rows().iter().enumerate() {
            let Some(cell) = row[target].as_deref() else {
                continue;
            };
            let fragments = split_cell(cell, self.policy);
            if fragments.is_empty() {
                debug!("Row {} has no values in '{}'", i, column);
            }
            for value in fragments {
                expansion.entries.push(ExpandedEntry {
                    title: row[title].clone().unwrap_or_default(),
                    citation: row[citation].clone().unwrap_or_default(),
                    value,
                });
            }
        }

        info!(
            "Expanded '{}' into {} entries from {} rows",
            column,
            expansion.len(),
            table.len()
        );
        Ok(expansion)
    }
}

/// Persist an expansion as `title,citation,<column>`.
pub fn write_entries(path: &Path, expansion: &Expansion) -> Result<()> {
    expansion.to_table().write_csv(path)?;
    info!("Saved {} entries to {}", expansion.len(), path.display());
    Ok(())
}

/// Read back a table written by [`write_entries`].
pub fn read_entries(path: &Path, column: &str) -> Result<Expansion> {
    let mut table = Table::read_delimited(path, b',')?;
    table.normalize_column_names();
    entries_from_table(&table, column)
}

/// Collect already-exploded rows without splitting the value column again.
pub fn entries_from_table(table: &Table, column: &str) -> Result<Expansion> {
    let title = table.resolve_column(TITLE_COLUMN, &[]);
    let citation = table.resolve_column(CITATION_COLUMN, &[]);
    let (Some(title), Some(citation)) = (title, citation) else {
        return Err(ReviewError::missing_columns(
            [TITLE_COLUMN, CITATION_COLUMN]
                .into_iter()
                .filter(|c| table.resolve_column(c, &[]).is_none()),
        ));
    };

    let mut expansion = Expansion {
        column: column.to_string(),
        entries: Vec::new(),
    };
    let Some(target) = table.resolve_column(column, alternate_column_names(column)) else {
        warn!("Column '{}' not found; returning no entries", column);
        return Ok(expansion);
    };

    expansion.entries = table
        .rows()
        .iter()
        .filter_map(|row| {
            let value = row[target].as_deref()?.trim();
            (!value.is_empty()).then(|| ExpandedEntry {
                title: row[title].clone().unwrap_or_default(),
                citation: row[citation].clone().unwrap_or_default(),
                value: value.to_string(),
            })
        })
        .collect();
    Ok(expansion)
}
