//! Descriptive outputs built on the processing core: frequency tables,
//! crosstabs, the preprocessing flow graph and the step overlap matrix.
//! Everything here produces data files and printable summaries; no rendering.

pub mod flow_graph;
pub mod overlap;
pub mod stats;

pub use flow_graph::{EdgeBand, FlowGraph};
pub use overlap::OverlapMatrix;
pub use stats::{ArtifactSummary, CrossTab, ValueCount};
