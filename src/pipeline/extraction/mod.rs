// Full-text processing: research-article filtering and methods section extraction

pub mod methods;
pub mod research;
pub mod similarity;
pub mod xml;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// `*.xml` files directly inside `dir`, sorted by name.
pub fn xml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    files_with_extension(dir, "xml")
}

pub(crate) fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == extension))
        .collect();
    files.sort();
    Ok(files)
}
