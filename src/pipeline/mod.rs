// Review pipeline: article ingestion, section extraction, and spreadsheet processing

pub mod extraction;
pub mod ingestion;
pub mod processing;
