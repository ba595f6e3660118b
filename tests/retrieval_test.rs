use async_trait::async_trait;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

use litreview::app::ports::{HttpClientPort, HttpGetResult};
use litreview::app::retrieve_use_case::{RetrieveReport, RetrieveUseCase};
use litreview::config::{NcbiConfig, Paths};
use litreview::constants::SEARCH_LOG_FILE;
use litreview::error::Result;
use litreview::infra::article_store::FileArticleStore;
use litreview::pipeline::ingestion::PmcClient;

/// Answers by URL fragment, like a tiny E-utilities stub
struct StubEutils {
    routes: Vec<(&'static str, u16, &'static str)>,
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl HttpClientPort for StubEutils {
    async fn get(&self, url: &str) -> Result<HttpGetResult> {
        self.requested.lock().unwrap().push(url.to_string());
        let (status, body) = self
            .routes
            .iter()
            .find(|(fragment, _, _)| url.contains(fragment))
            .map(|(_, status, body)| (*status, body.to_string()))
            .unwrap_or((404, String::new()));
        Ok(HttpGetResult { status, body })
    }
}

const MESH: &str = r#"<eSearchResult><QueryTranslation>"gait"[MeSH Terms] OR gait[All Fields]</QueryTranslation></eSearchResult>"#;
const SEARCH: &str = "<eSearchResult><Count>2</Count><IdList><Id>101</Id><Id>102</Id></IdList></eSearchResult>";
const ARTICLE: &str = r#"<pmc-articleset><article article-type="research-article"/></pmc-articleset>"#;

fn ncbi() -> NcbiConfig {
    NcbiConfig { requests_per_min: 0, initial_backoff_ms: 0, email: Some("me@example.org".into()), ..NcbiConfig::default() }
}

#[tokio::test]
async fn test_retrieve_saves_available_full_texts_and_logs_search() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let paths = Paths { root: dir.path().to_path_buf(), ..Paths::default() };
    let http = StubEutils {
        routes: vec![
            ("db=mesh", 200, MESH),
            ("esearch.fcgi?db=pmc", 200, SEARCH),
            ("id=101&", 200, ARTICLE),
        ],
        requested: Mutex::new(Vec::new()),
    };
    let client = PmcClient::new(Box::new(http), &ncbi());
    let use_case = RetrieveUseCase::new(client, Box::new(FileArticleStore::new(&paths)));

    let report = use_case.run(&["Gait".to_string()]).await?;
    assert_eq!(report, RetrieveReport { found: 2, saved: 1, missing: vec!["102".to_string()] });

    assert_eq!(fs::read_to_string(paths.fulltexts_dir().join("101.xml"))?, ARTICLE);
    assert!(!paths.fulltexts_dir().join("102.xml").exists());

    let log = fs::read_to_string(paths.logs_dir().join(SEARCH_LOG_FILE))?;
    assert!(log.contains("Search Query: Gait\n"));
    assert!(log.contains("PMC IDs Found: PMC101, PMC102\n"));
    Ok(())
}

#[tokio::test]
async fn test_query_expands_each_keyword_with_mesh_terms() {
    let http = StubEutils { routes: vec![("db=mesh", 200, MESH)], requested: Mutex::new(Vec::new()) };
    let client = PmcClient::new(Box::new(http), &ncbi());
    assert_eq!(client.mesh_terms("Gait").await, vec!["gait"]);
    assert_eq!(
        client.build_query(&["Gait".to_string(), "EEG".to_string()]).await,
        r#"("Gait"[Title/Abstract] OR "gait"[MeSH Terms]) AND ("EEG"[Title/Abstract] OR "gait"[MeSH Terms])"#
    );
}

#[tokio::test]
async fn test_empty_search_writes_nothing() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let paths = Paths { root: dir.path().to_path_buf(), ..Paths::default() };
    let http = StubEutils { routes: vec![], requested: Mutex::new(Vec::new()) };
    let client = PmcClient::new(Box::new(http), &ncbi());
    let report = RetrieveUseCase::new(client, Box::new(FileArticleStore::new(&paths)))
        .run(&["Nothing".to_string()])
        .await?;
    assert_eq!(report.found, 0);
    assert!(!paths.logs_dir().join(SEARCH_LOG_FILE).exists());
    Ok(())
}
