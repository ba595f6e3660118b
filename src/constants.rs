/// Column and file name constants shared across the pipeline.
/// Column names are the normalized (lowercase, underscore) forms.

pub const TITLE_COLUMN: &str = "title";
pub const CITATION_COLUMN: &str = "citation";

// Multi-valued free-text columns
pub const ARTIFACT_METHODS_COLUMN: &str = "artifactrej_methods";
pub const STEP_KEYWORDS_COLUMN: &str = "step_keywords";
pub const OUTCOME_KEYWORDS_COLUMN: &str = "outcome_keywords_script";
pub const EEG_ELECTRODES_COLUMN: &str = "type_of_eeg_electrodes";
pub const GAIT_SYSTEM_COLUMN: &str = "gait_measurement_system";

// Single-valued study descriptors
pub const COHORT_COLUMN: &str = "cohort";
pub const GAIT_TASK_COLUMN: &str = "gait_task";

/// Historical names a column went by in earlier spreadsheet revisions
pub fn alternate_column_names(column: &str) -> &'static [&'static str] {
    match column {
        STEP_KEYWORDS_COLUMN => &["corrected_keywords_vv", "pipeline_steps"],
        OUTCOME_KEYWORDS_COLUMN => &["outcome_keywords"],
        _ => &[],
    }
}

/// The spreadsheet export is semicolon-delimited
pub const SPREADSHEET_DELIMITER: u8 = b';';

// Cleaned long-table outputs
pub const ARTIFACT_METHODS_FILE: &str = "Artifact_Methods_cleaned.csv";
pub const STEP_KEYWORDS_FILE: &str = "Step_Keywords_cleaned.csv";
pub const OUTCOME_KEYWORDS_FILE: &str = "Outcome_Keywords_cleaned.csv";

// Report outputs
pub const FLOW_NODES_FILE: &str = "fig3_stepsnetwork_nodes.csv";
pub const FLOW_EDGES_FILE: &str = "fig3_stepsnetwork_edges.csv";
pub const FLOW_DOT_FILE: &str = "fig3_stepsnetwork.dot";
pub const FLOW_COUNTS_FILE: &str = "fig3_stepsnetwork_counts.json";
pub const OVERLAP_MATRIX_FILE: &str = "fig4_steps_upset.csv";
pub const ARTIFACT_MATRIX_FILE: &str = "fig5_artifactrej.csv";
pub const COHORT_TASK_FILE: &str = "fig1_cohort_task.csv";
pub const ELECTRODE_GAIT_FILE: &str = "fig2_eeg_gait_heatmap.csv";

// Acquisition outputs
pub const SEARCH_LOG_FILE: &str = "keyword_overview.txt";
pub const RESEARCH_ARTICLE_TYPE: &str = "research-article";

/// Default query used by the `retrieve` command
pub const DEFAULT_KEYWORDS: &[&str] = &["Mobile-EEG", "Gait"];
