use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, ReviewError};
use crate::pipeline::processing::expand::SplitPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "litreview.toml";

/// Run configuration handed to each component at construction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: Paths,
    pub ncbi: NcbiConfig,
    pub extraction: ExtractionConfig,
    pub expand: ExpandConfig,
}

/// Directory layout of a review project. Relative entries resolve against `root`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub root: PathBuf,
    pub data: PathBuf,
    pub logs: PathBuf,
    pub results: PathBuf,
    pub fulltexts: PathBuf,
    pub research_articles: PathBuf,
    pub methods: PathBuf,
    pub cleaned: PathBuf,
    pub plots: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            data: PathBuf::from("data"),
            logs: PathBuf::from("logs"),
            results: PathBuf::from("results"),
            fulltexts: PathBuf::from("results/fulltexts"),
            research_articles: PathBuf::from("results/researcharticles"),
            methods: PathBuf::from("results/methods"),
            cleaned: PathBuf::from("results/cleanresults"),
            plots: PathBuf::from("plots"),
        }
    }
}

impl Paths {
    fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }

    pub fn data_dir(&self) -> PathBuf { self.resolve(&self.data) }
    pub fn logs_dir(&self) -> PathBuf { self.resolve(&self.logs) }
    pub fn results_dir(&self) -> PathBuf { self.resolve(&self.results) }
    pub fn fulltexts_dir(&self) -> PathBuf { self.resolve(&self.fulltexts) }
    pub fn research_articles_dir(&self) -> PathBuf { self.resolve(&self.research_articles) }
    pub fn methods_dir(&self) -> PathBuf { self.resolve(&self.methods) }
    pub fn cleaned_dir(&self) -> PathBuf { self.resolve(&self.cleaned) }
    pub fn plots_dir(&self) -> PathBuf { self.resolve(&self.plots) }

    /// Create every directory of the layout if it does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        for dir in [
            self.data_dir(),
            self.logs_dir(),
            self.results_dir(),
            self.fulltexts_dir(),
            self.research_articles_dir(),
            self.methods_dir(),
            self.cleaned_dir(),
            self.plots_dir(),
        ] {
            fs::create_dir_all(&dir)?;
            debug!("Ensured directory {}", dir.display());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NcbiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// NCBI allows 3 requests/s without an API key and 10 with one. 0 disables pacing.
    pub requests_per_min: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub tool: String,
    pub email: Option<String>,
    pub api_key: Option<String>,
}

impl Default for NcbiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            timeout_seconds: 10,
            requests_per_min: 180,
            max_retries: 3,
            initial_backoff_ms: 500,
            tool: "litreview".to_string(),
            email: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum fuzzy score (0-100) for a section title to count as a methods heading.
    pub similarity_threshold: u8,
    pub reference_titles: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 80,
            reference_titles: ["methods", "materials and methods", "methodology", "method"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExpandConfig {
    pub slash_policy: SplitPolicy,
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the file is absent.
    /// `NCBI_API_KEY` and `NCBI_EMAIL` (also read from `.env`) override the file.
    pub fn load(path: &Path) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ReviewError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            let config: Config = toml::from_str(&content)?;
            info!("Loaded configuration from {}", path.display());
            config
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Config::default()
        };

        if let Ok(key) = std::env::var("NCBI_API_KEY") {
            if !key.trim().is_empty() {
                config.ncbi.api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(email) = std::env::var("NCBI_EMAIL") {
            if !email.trim().is_empty() {
                config.ncbi.email = Some(email.trim().to_string());
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.extraction.similarity_threshold > 100 {
            return Err(ReviewError::Config(format!(
                "similarity_threshold must be within 0..=100, got {}",
                self.extraction.similarity_threshold
            )));
        }
        if self.extraction.reference_titles.is_empty() {
            return Err(ReviewError::Config("reference_titles must not be empty".to_string()));
        }
        Ok(())
    }
}
