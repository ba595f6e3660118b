use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::rate_limiter::RateLimiter;
use super::retry::RetryPolicy;
use crate::app::ports::{HttpClientPort, HttpGetResult};
use crate::config::NcbiConfig;
use crate::error::{Result, ReviewError};
use crate::pipeline::extraction::xml::XmlElement;

static MESH_TERM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)"\[MeSH Terms\]"#).unwrap());

/// At most this many MeSH terms are folded into a keyword clause
pub const MAX_MESH_TERMS: usize = 5;
const SEARCH_RETMAX: &str = "10000";

/// NCBI E-utilities client for PubMed Central searches and full-text retrieval.
///
/// Every request goes through the shared rate limiter and the retry policy.
/// Failures are logged and surface as empty results, never as errors.
pub struct PmcClient<H: HttpClientPort + ?Sized> {
    http: Box<H>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    config: NcbiConfig,
}

impl<H: HttpClientPort + ?Sized> PmcClient<H> {
    pub fn new(http: Box<H>, config: &NcbiConfig) -> Self {
        Self {
            http,
            limiter: RateLimiter::new(config.requests_per_min),
            retry: RetryPolicy::from_config(config),
            config: config.clone(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, endpoint: &str, params: &[(&str, &str)]) -> String {
        let mut pairs: Vec<(&str, &str)> = params.to_vec();
        pairs.push(("retmode", "xml"));
        if !self.config.tool.is_empty() {
            pairs.push(("tool", self.config.tool.as_str()));
        }
        if let Some(email) = &self.config.email {
            pairs.push(("email", email.as_str()));
        }
        if let Some(key) = &self.config.api_key {
            pairs.push(("api_key", key.as_str()));
        }
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}/{}.fcgi?{}", self.config.base_url.trim_end_matches('/'), endpoint, query)
    }

    async fn get(&self, url: &str) -> Result<HttpGetResult> {
        let mut attempt = 1;
        loop {
            self.limiter.acquire().await;
            let failure = match self.http.get(url).await {
                Ok(resp) if resp.is_success() => return Ok(resp),
                Ok(resp) if RetryPolicy::is_retryable_status(resp.status) => ReviewError::Status {
                    status: resp.status,
                    url: url.to_string(),
                },
                Ok(resp) => {
                    return Err(ReviewError::Status { status: resp.status, url: url.to_string() })
                }
                Err(e) => e,
            };
            if !self.retry.should_retry(attempt) {
                return Err(failure);
            }
            let delay: Duration = self.retry.backoff(attempt);
            warn!(
                "Request failed (attempt {}/{}): {}; retrying in {:?}",
                attempt, self.retry.max_attempts, failure, delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Up to five MeSH headings NCBI maps `keyword` to. Empty on any failure.
    pub async fn mesh_terms(&self, keyword: &str) -> Vec<String> {
        match self.try_mesh_terms(keyword).await {
            Ok(terms) => terms,
            Err(e) => {
                warn!("MeSH retrieval error for '{}': {}", keyword, e);
                Vec::new()
            }
        }
    }

    async fn try_mesh_terms(&self, keyword: &str) -> Result<Vec<String>> {
        let url = self.url("esearch", &[("db", "mesh"), ("term", keyword)]);
        let resp = self.get(&url).await?;
        let root = XmlElement::parse(&resp.body)?;
        let translation = root
            .find_all("QueryTranslation")
            .into_iter()
            .find_map(|e| e.text.clone());
        Ok(translation.map(|t| parse_mesh_terms(&t)).unwrap_or_default())
    }

    /// AND-combination of one clause per keyword, each expanded with its MeSH terms.
    pub async fn build_query(&self, keywords: &[String]) -> String {
        let mut clauses = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let terms = self.mesh_terms(keyword).await;
            debug!("MeSH terms for '{}': {:?}", keyword, terms);
            clauses.push(keyword_clause(keyword, &terms));
        }
        clauses.join(" AND ")
    }

    /// PMC ids matching all `keywords`. Empty on any failure.
    pub async fn search(&self, keywords: &[String]) -> Vec<String> {
        let query = self.build_query(keywords).await;
        info!("Searching PMC: {}", query);
        match self.try_search(&query).await {
            Ok(ids) => {
                info!("Total articles found: {}", ids.len());
                ids
            }
            Err(e) => {
                warn!("PMC search failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<String>> {
        let url = self.url("esearch", &[("db", "pmc"), ("term", query), ("retmax", SEARCH_RETMAX)]);
        let resp = self.get(&url).await?;
        Ok(parse_id_list(&XmlElement::parse(&resp.body)?))
    }

    /// Full-text XML of one article, `None` when NCBI does not answer with 200.
    pub async fn fetch_full_text(&self, pmc_id: &str) -> Option<String> {
        let url = self.url("efetch", &[("db", "pmc"), ("id", pmc_id)]);
        match self.get(&url).await {
            Ok(resp) => Some(resp.body),
            Err(e) => {
                warn!("Could not fetch full text for PMC ID {}: {}", pmc_id, e);
                None
            }
        }
    }
}

pub fn parse_mesh_terms(translation: &str) -> Vec<String> {
    MESH_TERM_RE
        .captures_iter(translation)
        .map(|c| c[1].to_string())
        .take(MAX_MESH_TERMS)
        .collect()
}

/// `("kw"[Title/Abstract] OR "term"[MeSH Terms] ...)`
pub fn keyword_clause(keyword: &str, mesh_terms: &[String]) -> String {
    let terms: Vec<String> = std::iter::once(format!("\"{keyword}\"[Title/Abstract]"))
        .chain(mesh_terms.iter().map(|t| format!("\"{t}\"[MeSH Terms]")))
        .collect();
    format!("({})", terms.join(" OR "))
}

fn parse_id_list(root: &XmlElement) -> Vec<String> {
    root.find_all("IdList")
        .into_iter()
        .flat_map(|list| list.children.iter().filter(|c| c.name == "Id"))
        .filter_map(|id| id.text.as_deref().map(str::trim))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses in order and records requested URLs
    struct ScriptedHttp {
        responses: Mutex<VecDeque<Result<HttpGetResult>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedHttp {
        fn new(responses: Vec<Result<HttpGetResult>>) -> Self {
            Self { responses: Mutex::new(responses.into()), calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl HttpClientPort for ScriptedHttp {
        async fn get(&self, url: &str) -> Result<HttpGetResult> {
            self.calls.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(HttpGetResult { status: 404, body: String::new() }))
        }
    }

    fn ok(body: &str) -> Result<HttpGetResult> {
        Ok(HttpGetResult { status: 200, body: body.to_string() })
    }

    fn status(code: u16) -> Result<HttpGetResult> {
        Ok(HttpGetResult { status: code, body: String::new() })
    }

    fn client(responses: Vec<Result<HttpGetResult>>) -> PmcClient<ScriptedHttp> {
        let config = NcbiConfig { requests_per_min: 0, ..NcbiConfig::default() };
        PmcClient::new(Box::new(ScriptedHttp::new(responses)), &config)
            .with_retry(RetryPolicy::new(3, Duration::ZERO))
    }

    #[test]
    fn test_parse_mesh_terms_caps_at_five() {
        let translation = r#""gait"[MeSH Terms] OR "a"[MeSH Terms] OR "b"[MeSH Terms] OR "c"[MeSH Terms] OR "d"[MeSH Terms] OR "e"[MeSH Terms] OR gait[All Fields]"#;
        assert_eq!(parse_mesh_terms(translation), vec!["gait", "a", "b", "c", "d"]);
    }

    #[test]
    fn test_keyword_clause() {
        assert_eq!(keyword_clause("Gait", &[]), r#"("Gait"[Title/Abstract])"#);
        assert_eq!(
            keyword_clause("Gait", &["gait".to_string()]),
            r#"("Gait"[Title/Abstract] OR "gait"[MeSH Terms])"#
        );
    }

    #[tokio::test]
    async fn test_search_builds_query_and_parses_ids() {
        let client = client(vec![
            ok(r#"<eSearchResult><QueryTranslation>"gait"[MeSH Terms] OR gait[All Fields]</QueryTranslation></eSearchResult>"#),
            ok("<eSearchResult><Count>2</Count><IdList><Id>111</Id><Id> 222 </Id></IdList></eSearchResult>"),
        ]);
        let ids = client.search(&["Gait".to_string()]).await;
        assert_eq!(ids, vec!["111", "222"]);

        let calls = client.http.calls.lock().unwrap();
        assert!(calls[0].contains("esearch.fcgi?db=mesh&term=Gait"));
        assert!(calls[1].contains("db=pmc"));
        assert!(calls[1].contains("retmax=10000"));
        assert!(calls[1].contains(&*urlencoding::encode(r#"("Gait"[Title/Abstract] OR "gait"[MeSH Terms])"#)));
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let client = client(vec![status(503), status(429), ok("<pmc-articleset/>")]);
        assert_eq!(client.fetch_full_text("42").await.as_deref(), Some("<pmc-articleset/>"));
        assert_eq!(client.http.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let client = client(vec![status(500), status(500), status(500), ok("late")]);
        assert_eq!(client.fetch_full_text("42").await, None);
        assert_eq!(client.http.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let client = client(vec![status(404), ok("unused")]);
        assert_eq!(client.fetch_full_text("42").await, None);
        assert_eq!(client.http.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failures_become_empty_results() {
        let client = client(vec![
            Err(ReviewError::MalformedXml("connection reset".to_string())),
            Err(ReviewError::MalformedXml("connection reset".to_string())),
            Err(ReviewError::MalformedXml("connection reset".to_string())),
            ok("not xml <"),
        ]);
        assert!(client.mesh_terms("Gait").await.is_empty());
        // the fourth response is malformed, so the search itself also yields nothing
        assert!(client.search(&[]).await.is_empty());
    }
}
