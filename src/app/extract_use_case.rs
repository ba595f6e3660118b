use anyhow::{Context, Result};
use tracing::info_span;

use crate::config::Config;
use crate::pipeline::extraction::methods::{ExtractionReport, MethodsExtractor};
use crate::pipeline::extraction::research::{filter_research_articles, FilterReport};

/// Copy research articles out of the downloaded full texts.
pub fn filter_articles(config: &Config) -> Result<FilterReport> {
    let _span = info_span!("filter").entered();
    let source = config.paths.fulltexts_dir();
    let destination = config.paths.research_articles_dir();
    filter_research_articles(&source, &destination)
        .with_context(|| format!("Failed to filter articles in {}", source.display()))
}

/// Write the methods section of every research article as plain text.
pub fn extract_methods(config: &Config) -> Result<ExtractionReport> {
    let _span = info_span!("extract_methods").entered();
    let source = config.paths.research_articles_dir();
    MethodsExtractor::new(&config.extraction)
        .extract_dir(&source, &config.paths.methods_dir())
        .with_context(|| format!("Failed to extract methods from {}", source.display()))
}
