use anyhow::Result;
use std::fs;
use tempfile::tempdir;

use litreview::app::clean_use_case::CleanUseCase;
use litreview::app::report_use_case;
use litreview::config::{Config, Paths};
use litreview::constants::{
    ARTIFACT_METHODS_COLUMN, ARTIFACT_METHODS_FILE, FLOW_COUNTS_FILE, FLOW_DOT_FILE,
    FLOW_EDGES_FILE, FLOW_NODES_FILE, OUTCOME_KEYWORDS_COLUMN, OUTCOME_KEYWORDS_FILE,
    OVERLAP_MATRIX_FILE, STEP_KEYWORDS_COLUMN, STEP_KEYWORDS_FILE,
};
use litreview::pipeline::processing::citation::Disambiguation;
use litreview::pipeline::processing::expand::{read_entries, RowExpander, SplitPolicy};
use litreview::pipeline::processing::normalize::TextNormalizer;

const SPREADSHEET: &str = "\
Title;Citation;Step keywords;Outcome keywords script;ArtifactRej methods
A;Smith2020;\"High-pass filter, IC decomposition, Epoching\";\"PSD, ERD/ERS\";\"ASR; ICA\"
B;Smith2020;\"High-pass filter; IC decomposition\";PSD;ASR
C;Doe2021;nan;ERSP;none
D;;Epoching;PSD;
A;Smith2020;\"High-pass filter, IC decomposition, Epoching\";\"PSD, ERD/ERS\";\"ASR; ICA\"
";

fn project() -> Result<(tempfile::TempDir, Config)> {
    let dir = tempdir()?;
    let config = Config {
        paths: Paths { root: dir.path().to_path_buf(), ..Paths::default() },
        ..Config::default()
    };
    config.paths.ensure()?;
    fs::write(config.paths.data_dir().join("export.csv"), SPREADSHEET)?;
    Ok((dir, config))
}

fn clean(config: &Config) -> Result<litreview::app::clean_use_case::CleanReport> {
    CleanUseCase::new(TextNormalizer::default(), RowExpander::new(SplitPolicy::PreserveSlash))
        .run(&config.paths.data_dir().join("export.csv"), &config.paths.cleaned_dir())
}

#[test]
fn test_repeated_citations_are_expanded_under_distinct_labels() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("export.csv");
    fs::write(&input, "Title;Citation;Step keywords\nA;Smith2020;\"X; Y\"\nB;Smith2020;Z\n")?;

    CleanUseCase::new(TextNormalizer::default(), RowExpander::default())
        .run(&input, dir.path())?;

    let steps = read_entries(&dir.path().join(STEP_KEYWORDS_FILE), STEP_KEYWORDS_COLUMN)?;
    let rows: Vec<(&str, &str)> = steps
        .entries
        .iter()
        .map(|e| (e.citation.as_str(), e.value.as_str()))
        .collect();
    assert_eq!(rows, vec![("Smith2020", "X"), ("Smith2020", "Y"), ("Smith2020-b", "Z")]);
    Ok(())
}

#[test]
fn test_clean_writes_long_tables() -> Result<()> {
    let (_dir, config) = project()?;
    let report = clean(&config)?;

    assert_eq!(report.rows_read, 5);
    assert_eq!(report.rows_kept, 3);
    assert_eq!(report.normalize.duplicate_rows_dropped, 1);
    assert_eq!(report.normalize.missing_identity_dropped, 1);
    assert_eq!(report.normalize.cells_nulled, 2);
    assert_eq!(report.disambiguation, Disambiguation::Applied { renamed: 1 });

    let entries: Vec<(&str, usize)> = report
        .outputs
        .iter()
        .map(|o| (o.column.as_str(), o.entries))
        .collect();
    assert_eq!(
        entries,
        vec![(ARTIFACT_METHODS_COLUMN, 3), (STEP_KEYWORDS_COLUMN, 5), (OUTCOME_KEYWORDS_COLUMN, 4)]
    );

    let artifacts = fs::read_to_string(config.paths.cleaned_dir().join(ARTIFACT_METHODS_FILE))?;
    assert!(artifacts.starts_with("title,citation,artifactrej_methods\n"));
    assert!(artifacts.contains("B,Smith2020-b,ASR"));

    let outcomes = read_entries(&config.paths.cleaned_dir().join(OUTCOME_KEYWORDS_FILE), OUTCOME_KEYWORDS_COLUMN)?;
    assert!(outcomes.values().any(|v| v == "ERD/ERS"));
    Ok(())
}

#[test]
fn test_flow_report_from_cleaned_tables() -> Result<()> {
    let (_dir, config) = project()?;
    clean(&config)?;

    let report = report_use_case::flow(&config)?;
    let counts = &report.counts;
    assert_eq!(counts.studies, 3);
    assert_eq!(counts.frequency["High-pass filter"], 2);
    assert_eq!(counts.frequency["Epoching"], 1);
    assert_eq!(counts.outcome_frequency["PSD"], 2);
    assert_eq!(counts.outcome_frequency["ERSP"], 1);

    let pair = |a: &str, b: &str| (a.to_string(), b.to_string());
    assert_eq!(counts.transitions[&pair("High-pass filter", "IC decomposition")], 2);
    assert_eq!(counts.transitions[&pair("Epoching", "ERD/ERS")], 1);
    assert_eq!(counts.transitions[&pair("IC decomposition", "PSD")], 1);
    assert_eq!(counts.total_transitions(), 6);
    assert_eq!(counts.cooccurrence[&pair("High-pass filter", "IC decomposition")], 2);

    // every transition endpoint is a graph node
    assert_eq!(report.graph.edges.len(), counts.transitions.len());
    assert_eq!(report.graph.node("PSD").map(|n| n.y), Some(-5.0));

    let plots = config.paths.plots_dir();
    for file in [FLOW_NODES_FILE, FLOW_EDGES_FILE, FLOW_DOT_FILE, FLOW_COUNTS_FILE] {
        assert!(plots.join(file).exists(), "{file} missing");
    }
    let summary: serde_json::Value = serde_json::from_str(&fs::read_to_string(plots.join(FLOW_COUNTS_FILE))?)?;
    assert_eq!(summary["studies"], 3);
    assert_eq!(summary["transitions"][0]["from"], "High-pass filter");
    Ok(())
}

#[test]
fn test_overlap_and_artifact_reports() -> Result<()> {
    let (_dir, config) = project()?;
    clean(&config)?;

    let matrix = report_use_case::overlap(&config)?;
    assert_eq!(matrix.steps, vec!["Epoching", "High-pass filter", "IC decomposition"]);
    assert_eq!(matrix.studies.len(), 2);
    assert_eq!(matrix.top_pairs(1)[0].count, 2);
    assert!(config.paths.plots_dir().join(OVERLAP_MATRIX_FILE).exists());

    let summary = report_use_case::artifacts(&config)?;
    assert_eq!(summary.studies, 2);
    assert_eq!(summary.unique_methods, 2);
    assert_eq!(summary.multi_method_studies, 1);
    assert_eq!(summary.top_methods[0].value, "ASR");
    Ok(())
}

#[test]
fn test_flow_without_cleaned_tables_fails() {
    let dir = tempdir().unwrap();
    let config = Config {
        paths: Paths { root: dir.path().to_path_buf(), ..Paths::default() },
        ..Config::default()
    };
    let err = report_use_case::flow(&config).err().expect("flow should fail");
    assert!(format!("{err:#}").contains("run the clean command first"));
}
