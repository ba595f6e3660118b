use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::app::ports::{ArticleStorePort, HttpClientPort};
use crate::pipeline::ingestion::{PmcClient, SearchLogEntry};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrieveReport {
    pub found: usize,
    pub saved: usize,
    pub missing: Vec<String>,
}

/// Search PMC, download every hit and record the search
pub struct RetrieveUseCase<H: HttpClientPort + ?Sized, S: ArticleStorePort + ?Sized> {
    client: PmcClient<H>,
    store: Box<S>,
}

impl<H: HttpClientPort + ?Sized, S: ArticleStorePort + ?Sized> RetrieveUseCase<H, S> {
    pub fn new(client: PmcClient<H>, store: Box<S>) -> Self {
        Self { client, store }
    }

    pub async fn run(&self, keywords: &[String]) -> Result<RetrieveReport> {
        let ids = self.client.search(keywords).await;
        let mut report = RetrieveReport { found: ids.len(), ..Default::default() };
        if ids.is_empty() {
            warn!("No PMC IDs found for keywords {:?}", keywords);
            return Ok(report);
        }

        for id in &ids {
            match self.client.fetch_full_text(id).await {
                Some(xml) if !xml.is_empty() => {
                    self.store
                        .save_full_text(id, &xml)
                        .with_context(|| format!("Failed to save full text for PMC ID {id}"))?;
                    report.saved += 1;
                }
                _ => report.missing.push(id.clone()),
            }
        }

        self.store
            .append_search_log(&SearchLogEntry::new(keywords, &ids))
            .context("Failed to append search log")?;
        info!(
            "Retrieved {} of {} articles ({} unavailable)",
            report.saved,
            report.found,
            report.missing.len()
        );
        Ok(report)
    }
}
