use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::xml::XmlElement;
use super::xml_files;
use crate::constants::RESEARCH_ARTICLE_TYPE;
use crate::error::{Result, ReviewError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub scanned: usize,
    pub copied: usize,
}

/// True when the first `<article>` element is typed `research-article`.
pub fn is_research_article(root: &XmlElement) -> bool {
    root.iter()
        .into_iter()
        .find(|e| e.name == "article")
        .and_then(|article| article.attr("article-type"))
        .is_some_and(|kind| kind == RESEARCH_ARTICLE_TYPE)
}

/// Parse errors are logged and count as "not a research article".
pub fn is_research_article_file(path: &Path) -> bool {
    let parsed = fs::read_to_string(path)
        .map_err(ReviewError::from)
        .and_then(|xml| XmlElement::parse(&xml));
    match parsed {
        Ok(root) => is_research_article(&root),
        Err(e) => {
            warn!("Error parsing file {}: {}", path.display(), e);
            false
        }
    }
}

/// Copy every research article XML in `source` into `destination`.
pub fn filter_research_articles(source: &Path, destination: &Path) -> Result<FilterReport> {
    fs::create_dir_all(destination)?;
    let mut report = FilterReport::default();

    for path in xml_files(source)? {
        report.scanned += 1;
        if !is_research_article_file(&path) {
            debug!("Not a research article: {}", path.display());
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        fs::copy(&path, destination.join(name))?;
        report.copied += 1;
        info!("Saved research article: {}", name.to_string_lossy());
    }

    info!("Kept {} of {} articles", report.copied, report.scanned);
    Ok(report)
}
