use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, info_span};

use crate::config::Config;
use crate::constants::{
    ARTIFACT_MATRIX_FILE, ARTIFACT_METHODS_COLUMN, ARTIFACT_METHODS_FILE, COHORT_TASK_FILE,
    ELECTRODE_GAIT_FILE, FLOW_COUNTS_FILE, FLOW_DOT_FILE, FLOW_EDGES_FILE, FLOW_NODES_FILE,
    OUTCOME_KEYWORDS_COLUMN, OUTCOME_KEYWORDS_FILE, OVERLAP_MATRIX_FILE, SPREADSHEET_DELIMITER,
    STEP_KEYWORDS_COLUMN, STEP_KEYWORDS_FILE,
};
use crate::pipeline::processing::aggregate::CorpusCounts;
use crate::pipeline::processing::expand::{read_entries, Expansion};
use crate::pipeline::processing::normalize::TextNormalizer;
use crate::pipeline::processing::sequence::build_study_keywords;
use crate::report::stats::{
    artifact_matrix, cohort_task_crosstab, electrode_gait_crosstab, electrode_gait_pairs,
    value_counts, ArtifactSummary, CrossTab, ValueCount,
};
use crate::report::{FlowGraph, OverlapMatrix};
use crate::table::Table;

pub struct FlowReport {
    pub counts: CorpusCounts,
    pub graph: FlowGraph,
}

pub struct ElectrodeReport {
    pub electrodes: Vec<ValueCount>,
    pub gait_systems: Vec<ValueCount>,
    pub crosstab: CrossTab,
}

fn load_cleaned(config: &Config, file: &str, column: &str) -> Result<Expansion> {
    let path = config.paths.cleaned_dir().join(file);
    read_entries(&path, column).with_context(|| {
        format!("Failed to read {} (run the clean command first)", path.display())
    })
}

/// Read the raw spreadsheet export with normalized headers and placeholders nulled.
pub fn load_spreadsheet(input: &Path) -> Result<Table> {
    let mut table = Table::read_delimited(input, SPREADSHEET_DELIMITER)
        .with_context(|| format!("Failed to read spreadsheet {}", input.display()))?;
    table.normalize_column_names();
    TextNormalizer::default().normalize(&mut table);
    Ok(table)
}

fn output_path(config: &Config, file: &str) -> Result<std::path::PathBuf> {
    let dir = config.paths.plots_dir();
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir.join(file))
}

/// Step/outcome statistics and the layered flow graph from the cleaned tables.
pub fn flow(config: &Config) -> Result<FlowReport> {
    let _span = info_span!("flow").entered();
    let steps = load_cleaned(config, STEP_KEYWORDS_FILE, STEP_KEYWORDS_COLUMN)?;
    let outcomes = load_cleaned(config, OUTCOME_KEYWORDS_FILE, OUTCOME_KEYWORDS_COLUMN)?;
    let studies = build_study_keywords(&steps, &outcomes);
    let counts = CorpusCounts::from_studies(&studies);
    let graph = FlowGraph::from_transitions(&counts.transitions);

    graph.write_nodes_csv(&output_path(config, FLOW_NODES_FILE)?)?;
    graph.write_edges_csv(&output_path(config, FLOW_EDGES_FILE)?)?;
    fs::write(output_path(config, FLOW_DOT_FILE)?, graph.to_dot())?;
    let summary = serde_json::to_string_pretty(&counts.summary())?;
    fs::write(output_path(config, FLOW_COUNTS_FILE)?, summary)?;

    info!(
        "Flow graph: {} studies, {} nodes, {} edges",
        counts.studies,
        graph.nodes.len(),
        graph.edges.len()
    );
    Ok(FlowReport { counts, graph })
}

pub fn overlap(config: &Config) -> Result<OverlapMatrix> {
    let _span = info_span!("overlap").entered();
    let steps = load_cleaned(config, STEP_KEYWORDS_FILE, STEP_KEYWORDS_COLUMN)?;
    let matrix = OverlapMatrix::from_expansion(&steps);
    matrix.to_table().write_csv(&output_path(config, OVERLAP_MATRIX_FILE)?)?;
    info!("Overlap matrix: {} studies x {} steps", matrix.studies.len(), matrix.steps.len());
    Ok(matrix)
}

pub fn artifacts(config: &Config) -> Result<ArtifactSummary> {
    let _span = info_span!("artifacts").entered();
    let methods = load_cleaned(config, ARTIFACT_METHODS_FILE, ARTIFACT_METHODS_COLUMN)?;
    artifact_matrix(&methods).write_csv(&output_path(config, ARTIFACT_MATRIX_FILE)?)?;
    Ok(ArtifactSummary::from_expansion(&methods))
}

pub fn cohort(config: &Config, input: &Path) -> Result<CrossTab> {
    let _span = info_span!("cohort").entered();
    let table = load_spreadsheet(input)?;
    let crosstab = cohort_task_crosstab(&table).context("Cannot build cohort x gait task table")?;
    crosstab.to_table().write_csv(&output_path(config, COHORT_TASK_FILE)?)?;
    Ok(crosstab)
}

pub fn electrodes(config: &Config, input: &Path) -> Result<ElectrodeReport> {
    let _span = info_span!("electrodes").entered();
    let table = load_spreadsheet(input)?;
    let pairs = electrode_gait_pairs(&table);
    let crosstab = electrode_gait_crosstab(&pairs);
    crosstab.to_table().write_csv(&output_path(config, ELECTRODE_GAIT_FILE)?)?;
    Ok(ElectrodeReport {
        electrodes: value_counts(pairs.iter().map(|(e, _)| e.as_str())),
        gait_systems: value_counts(pairs.iter().map(|(_, g)| g.as_str())),
        crosstab,
    })
}
