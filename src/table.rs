//! In-memory delimited table used by every processing step.
//!
//! Cells are `Option<String>`: `None` is the null marker produced by the
//! spreadsheet reader for empty fields and by the text normalizer for
//! placeholder tokens.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Result;

pub type Cell = Option<String>;

static COLUMN_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-]+").unwrap());

/// Lowercase a header and collapse whitespace/dash runs to `_` (`"Gait Task"` -> `gait_task`).
pub fn normalize_column_name(name: &str) -> String {
    let trimmed = name.trim_start_matches('\u{feff}').trim().to_lowercase();
    COLUMN_SEPARATORS.replace_all(&trimmed, "_").into_owned()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from string rows; empty strings become null cells.
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<&str>>,
    ) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(
                row.into_iter()
                    .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                    .collect(),
            );
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding with nulls or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        if row.len() > self.columns.len() {
            warn!(
                "Row has {} cells but table has {} columns; extra cells dropped",
                row.len(),
                self.columns.len()
            );
        }
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// Case-insensitive lookup of `name`, then of each alternate name in order.
    pub fn resolve_column(&self, name: &str, alternates: &[&str]) -> Option<usize> {
        std::iter::once(name)
            .chain(alternates.iter().copied())
            .find_map(|candidate| {
                self.columns
                    .iter()
                    .position(|c| c.trim().eq_ignore_ascii_case(candidate.trim()))
            })
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    pub fn set(&mut self, row: usize, col: usize, value: Cell) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    pub fn column_values(&self, col: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows
            .iter()
            .map(move |r| r.get(col).and_then(|c| c.as_deref()))
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Vec<Cell>> + '_ {
        self.rows.iter_mut()
    }

    /// Keep rows for which `keep` returns true; returns how many were removed.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Cell]) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| keep(r));
        before - self.rows.len()
    }

    pub fn normalize_column_names(&mut self) {
        for column in &mut self.columns {
            *column = normalize_column_name(column);
        }
    }

    /// Read a delimited file with a header row. Empty fields become null cells.
    pub fn read_delimited(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path)?;
        let table = Self::from_reader(file, delimiter)?;
        debug!(
            "Read {} rows x {} columns from {}",
            table.len(),
            table.columns.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut table = Self::new(rdr.headers()?.iter().map(str::to_string));
        for record in rdr.records() {
            let record = record?;
            table.push_row(
                record
                    .iter()
                    .map(|v| if v.is_empty() { None } else { Some(v.to_string()) })
                    .collect(),
            );
        }
        Ok(table)
    }

    /// Write comma-delimited with a header row; null cells are written empty.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
        }
        wtr.flush()?;
        Ok(())
    }
}
