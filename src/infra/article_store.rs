use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::app::ports::ArticleStorePort;
use crate::config::Paths;
use crate::constants::SEARCH_LOG_FILE;
use crate::error::Result;
use crate::pipeline::ingestion::search_log::SearchLogEntry;

/// Writes `<id>.xml` into the full-text directory and appends to the keyword log
pub struct FileArticleStore {
    fulltexts: PathBuf,
    search_log: PathBuf,
}

impl FileArticleStore {
    pub fn new(paths: &Paths) -> Self {
        Self {
            fulltexts: paths.fulltexts_dir(),
            search_log: paths.logs_dir().join(SEARCH_LOG_FILE),
        }
    }
}

impl ArticleStorePort for FileArticleStore {
    fn save_full_text(&self, pmc_id: &str, xml: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.fulltexts)?;
        let path = self.fulltexts.join(format!("{pmc_id}.xml"));
        fs::write(&path, xml)?;
        info!("Saved full text for PMC ID {} to {}", pmc_id, path.display());
        Ok(path)
    }

    fn append_search_log(&self, entry: &SearchLogEntry) -> Result<()> {
        entry.append_to(&self.search_log)
    }
}
