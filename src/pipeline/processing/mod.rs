// Spreadsheet processing: cleaning, disambiguation, explosion, and aggregation

pub mod aggregate;
pub mod citation;
pub mod expand;
pub mod normalize;
pub mod sequence;
pub mod stage;
