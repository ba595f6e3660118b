use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::similarity::ratio;
use super::xml::XmlElement;
use super::{files_with_extension, xml_files};
use crate::config::ExtractionConfig;
use crate::error::{Result, ReviewError};

/// Elements whose own text never belongs to a section body
const SKIPPED_TAGS: &[&str] = &["title", "sec"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub scanned: usize,
    pub extracted: usize,
    pub without_methods: usize,
    pub failed: usize,
}

/// Finds methods sections by `sec-type` or by fuzzy-matching their titles
#[derive(Debug, Clone)]
pub struct MethodsExtractor {
    reference_titles: Vec<String>,
    threshold: u8,
}

impl Default for MethodsExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

impl MethodsExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            reference_titles: config
                .reference_titles
                .iter()
                .map(|t| t.trim().to_lowercase())
                .collect(),
            threshold: config.similarity_threshold,
        }
    }

    pub fn is_methods_title(&self, title: &str) -> bool {
        let title = title.trim().to_lowercase();
        self.reference_titles
            .iter()
            .any(|reference| ratio(&title, reference) >= self.threshold)
    }

    pub fn is_methods_section(&self, section: &XmlElement) -> bool {
        if section.attr("sec-type") == Some("methods") {
            return true;
        }
        section
            .child("title")
            .and_then(|t| t.text.as_deref())
            .is_some_and(|title| self.is_methods_title(title))
    }

    /// Text of every matching `<sec>`, nested sections included, in document order.
    pub fn extract(&self, root: &XmlElement) -> Vec<String> {
        root.find_all("sec")
            .into_iter()
            .filter(|sec| self.is_methods_section(sec))
            .map(section_text)
            .collect()
    }

    pub fn extract_from_str(&self, xml: &str) -> Result<Vec<String>> {
        Ok(self.extract(&XmlElement::parse(xml)?))
    }

    /// Write `methods_<id>.txt` for every article in `input` that has a methods section.
    pub fn extract_dir(&self, input: &Path, output: &Path) -> Result<ExtractionReport> {
        fs::create_dir_all(output)?;
        let mut report = ExtractionReport::default();

        for path in xml_files(input)? {
            report.scanned += 1;
            let Some(id) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let sections = match fs::read_to_string(&path)
                .map_err(ReviewError::from)
                .and_then(|xml| self.extract_from_str(&xml))
            {
                Ok(sections) => sections,
                Err(e) => {
                    warn!("Error processing file {}: {}", path.display(), e);
                    report.failed += 1;
                    continue;
                }
            };

            if sections.is_empty() {
                debug!("No methods section found in {}", path.display());
                report.without_methods += 1;
                continue;
            }

            let target = output.join(format!("methods_{id}.txt"));
            fs::write(&target, sections.join("\n\n"))?;
            report.extracted += 1;
            info!("Extracted methods from {} -> {}", path.display(), target.display());
        }

        info!(
            "Methods extraction: {} extracted, {} without methods, {} failed of {}",
            report.extracted, report.without_methods, report.failed, report.scanned
        );
        Ok(report)
    }
}

/// Trimmed text and tails of all descendants except titles and section wrappers.
pub fn section_text(section: &XmlElement) -> String {
    section
        .iter()
        .into_iter()
        .filter(|e| !SKIPPED_TAGS.contains(&e.name.as_str()))
        .flat_map(|e| [e.text.as_deref(), e.tail.as_deref()])
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Contents of every `*.txt` file in `dir`, keyed by file name.
pub fn read_methods_texts(dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut texts = BTreeMap::new();
    for path in files_with_extension(dir, "txt")? {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        texts.insert(name, fs::read_to_string(&path)?.trim().to_string());
    }
    Ok(texts)
}
