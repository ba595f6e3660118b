use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;
use crate::pipeline::ingestion::search_log::SearchLogEntry;

// Acquisition-side ports
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub body: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Where retrieved articles and the search log end up
pub trait ArticleStorePort: Send + Sync {
    fn save_full_text(&self, pmc_id: &str, xml: &str) -> Result<PathBuf>;
    fn append_search_log(&self, entry: &SearchLogEntry) -> Result<()>;
}
