use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// One search recorded in the keyword overview log
#[derive(Debug, Clone)]
pub struct SearchLogEntry {
    pub keywords: Vec<String>,
    pub pmc_ids: Vec<String>,
    pub searched_at: DateTime<Local>,
}

impl SearchLogEntry {
    pub fn new(keywords: &[String], pmc_ids: &[String]) -> Self {
        Self {
            keywords: keywords.to_vec(),
            pmc_ids: pmc_ids.to_vec(),
            searched_at: Local::now(),
        }
    }

    pub fn render(&self) -> String {
        let ids = self
            .pmc_ids
            .iter()
            .map(|id| format!("PMC{id}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Search Query: {}\nFound {} articles\nPMC IDs Found: {}\nSearch Time: {}\n\n",
            self.keywords.join(" AND "),
            self.pmc_ids.len(),
            ids,
            self.searched_at.format("%Y-%m-%d %H:%M:%S%.6f"),
        )
    }

    pub fn append_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(self.render().as_bytes())?;
        Ok(())
    }
}
