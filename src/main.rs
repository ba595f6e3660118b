use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use litreview::app::clean_use_case::CleanUseCase;
use litreview::app::retrieve_use_case::RetrieveUseCase;
use litreview::app::{extract_use_case, report_use_case};
use litreview::config::{Config, DEFAULT_CONFIG_FILE};
use litreview::constants::DEFAULT_KEYWORDS;
use litreview::infra::article_store::FileArticleStore;
use litreview::infra::http_client::ReqwestHttp;
use litreview::logging;
use litreview::pipeline::ingestion::PmcClient;
use litreview::pipeline::processing::citation::Disambiguation;
use litreview::pipeline::processing::expand::RowExpander;
use litreview::pipeline::processing::normalize::TextNormalizer;

#[derive(Parser)]
#[command(name = "litreview")]
#[command(about = "Mobile EEG literature review pipeline: retrieval, extraction and keyword analysis")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults apply when it does not exist)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search PubMed Central and download full-text XML
    Retrieve {
        /// Keywords combined with AND (comma-separated)
        #[arg(long, value_delimiter = ',')]
        keywords: Option<Vec<String>>,
    },
    /// Copy research articles out of the downloaded full texts
    Filter,
    /// Extract methods sections from research articles
    ExtractMethods,
    /// Clean the spreadsheet export into long keyword tables
    Clean {
        /// Semicolon-delimited spreadsheet export
        #[arg(long)]
        input: PathBuf,
    },
    /// Step frequencies, transitions and the preprocessing flow graph
    Flow,
    /// Step overlap matrix and co-occurring pairs
    Overlap,
    /// Artifact rejection method summary
    Artifacts,
    /// Cohort x gait task distribution
    Cohort {
        #[arg(long)]
        input: PathBuf,
    },
    /// EEG electrode type x gait measurement system distribution
    Electrodes {
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    config.paths.ensure().context("Failed to create project directories")?;
    let _guard = logging::init_logging(&config.paths.logs_dir());
    info!("Starting litreview");

    match cli.command {
        Commands::Retrieve { keywords } => {
            let keywords: Vec<String> = keywords
                .map(|k| k.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or_else(|| DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect());
            println!("🔎 Searching PMC for: {}", keywords.join(" AND "));

            let http = ReqwestHttp::new(&config.ncbi).context("Failed to build HTTP client")?;
            let client = PmcClient::new(Box::new(http), &config.ncbi);
            let store = FileArticleStore::new(&config.paths);
            let report = RetrieveUseCase::new(client, Box::new(store)).run(&keywords).await?;

            println!("\n📊 Retrieval Results:");
            println!("   Articles found: {}", report.found);
            println!("   Full texts saved: {}", report.saved);
            if !report.missing.is_empty() {
                println!("\n⚠️  Could not fetch {} full texts:", report.missing.len());
                for id in &report.missing {
                    println!("   - PMC{}", id);
                }
            }
        }
        Commands::Filter => {
            let report = extract_use_case::filter_articles(&config)?;
            println!("\n📊 Research Article Filter:");
            println!("   Scanned: {}", report.scanned);
            println!("   Research articles copied: {}", report.copied);
        }
        Commands::ExtractMethods => {
            let report = extract_use_case::extract_methods(&config)?;
            println!("\n📊 Methods Extraction:");
            println!("   Articles scanned: {}", report.scanned);
            println!("   Methods extracted: {}", report.extracted);
            println!("   Without methods section: {}", report.without_methods);
            println!("   Failed: {}", report.failed);
        }
        Commands::Clean { input } => {
            let use_case = CleanUseCase::new(
                TextNormalizer::default(),
                RowExpander::new(config.expand.slash_policy),
            );
            let report = use_case.run(&input, &config.paths.cleaned_dir())?;
            println!("\n📊 Cleaning Results:");
            println!("   Rows read: {}", report.rows_read);
            println!("   Rows kept: {}", report.rows_kept);
            println!("   Cells nulled: {}", report.normalize.cells_nulled);
            match report.disambiguation {
                Disambiguation::Applied { renamed } => println!("   Citations renamed: {}", renamed),
                Disambiguation::Skipped => println!("   ⚠️  No citation column, disambiguation skipped"),
            }
            for output in &report.outputs {
                println!("   {}: {} entries -> {}", output.column, output.entries, output.path.display());
            }
        }
        Commands::Flow => {
            let report = report_use_case::flow(&config)?;
            let counts = &report.counts;
            println!("\n=== Preprocessing Steps (Count & %) ===");
            for step in counts.step_counts(None) {
                println!("{}: {} ({:.1}%)", step.keyword, step.count, step.percent);
            }
            println!("\n=== Top 20 Step Transitions (Count & %) ===");
            for t in counts.transition_counts(Some(20)) {
                println!("{} -> {}: {} ({:.1}%)", t.from, t.to, t.count, t.percent);
            }
            println!("\n📊 Flow graph: {} nodes, {} edges", report.graph.nodes.len(), report.graph.edges.len());
        }
        Commands::Overlap => {
            let matrix = report_use_case::overlap(&config)?;
            let counts = matrix.counts();
            println!("\n=== Descriptive Statistics ===");
            println!("Total studies: {}", counts.studies);
            println!("Unique preprocessing steps: {}\n", matrix.steps.len());
            println!("Most common preprocessing steps (count | % of studies):");
            for step in counts.step_counts(None) {
                println!("{}: {} | {:.1}%", step.keyword, step.count, step.percent);
            }
            println!("\nTop 10 most frequent co-occurring step pairs:");
            for pair in matrix.top_pairs(10) {
                println!("{} + {}: {}", pair.from, pair.to, pair.count);
            }
        }
        Commands::Artifacts => {
            let summary = report_use_case::artifacts(&config)?;
            println!("\n=== Descriptive Statistics ===");
            println!("Total studies with artifact rejection analyzed: {}", summary.studies);
            println!("Total unique artifact rejection methods: {}\n", summary.unique_methods);
            println!("Most common methods:");
            for method in &summary.top_methods {
                println!("{}: {}", method.value, method.count);
            }
            println!("\nAverage number of methods per study: {:.2}", summary.average_methods_per_study);
            println!("Number of studies using multiple methods: {}", summary.multi_method_studies);
        }
        Commands::Cohort { input } => {
            let crosstab = report_use_case::cohort(&config, &input)?;
            println!("\n=== Cohort vs. Gait Task ===");
            print!("{}", crosstab);
        }
        Commands::Electrodes { input } => {
            let report = report_use_case::electrodes(&config, &input)?;
            println!("\nNumber of studies per EEG electrode type:");
            for v in &report.electrodes {
                println!("{}: {} ({:.1}%)", v.value, v.count, v.percent);
            }
            println!("\nNumber of studies per gait measurement system:");
            for v in &report.gait_systems {
                println!("{}: {} ({:.1}%)", v.value, v.count, v.percent);
            }
            println!("\nEEG electrode type vs gait measurement system (cross-tabulation with percentages):");
            print!("{}", report.crosstab);
        }
    }

    Ok(())
}
