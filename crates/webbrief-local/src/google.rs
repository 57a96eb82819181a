use serde::Deserialize;
use webbrief_core::{Error, Result, SearchProvider, SearchQuery, SearchResponse, SearchResult};

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn google_api_key_from_env() -> Option<String> {
    env("WEBBRIEF_GOOGLE_API_KEY").or_else(|| env("GOOGLE_API_KEY"))
}

fn google_cx_from_env() -> Option<String> {
    env("WEBBRIEF_GOOGLE_CX").or_else(|| env("GOOGLE_CX"))
}

fn timeout_ms_from_query(q: &SearchQuery) -> u64 {
    // Provider requests can hang indefinitely without an explicit timeout.
    // Keep a conservative cap even if callers pass something huge.
    q.timeout_ms.unwrap_or(20_000).clamp(1_000, 60_000)
}

/// Explicit provider configuration, built once at startup and passed into
/// the constructor; nothing reads the environment at call time.
#[derive(Debug, Clone)]
pub struct GoogleSearchConfig {
    pub api_key: String,
    /// Programmable Search Engine id.
    pub cx: String,
    pub endpoint: String,
}

impl GoogleSearchConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = google_api_key_from_env().ok_or_else(|| {
            Error::NotConfigured("missing WEBBRIEF_GOOGLE_API_KEY (or GOOGLE_API_KEY)".to_string())
        })?;
        let cx = google_cx_from_env().ok_or_else(|| {
            Error::NotConfigured("missing WEBBRIEF_GOOGLE_CX (or GOOGLE_CX)".to_string())
        })?;
        Ok(Self {
            api_key,
            cx,
            endpoint: Self::default_endpoint(),
        })
    }

    fn default_endpoint() -> String {
        // Docs: https://developers.google.com/custom-search/v1/using_rest
        //
        // Allow override for testing/debugging (do not include secrets here).
        env("WEBBRIEF_GOOGLE_ENDPOINT")
            .unwrap_or_else(|| "https://customsearch.googleapis.com/customsearch/v1".to_string())
    }
}

#[derive(Debug, Clone)]
pub struct GoogleSearchProvider {
    client: reqwest::Client,
    config: GoogleSearchConfig,
}

impl GoogleSearchProvider {
    pub fn new(client: reqwest::Client, config: GoogleSearchConfig) -> Self {
        Self { client, config }
    }

    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        Ok(Self::new(client, GoogleSearchConfig::from_env()?))
    }
}

#[derive(Debug, Deserialize)]
struct CseSearchResponse {
    items: Option<Vec<CseItem>>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    title: Option<String>,
    link: Option<String>,
}

#[async_trait::async_trait]
impl SearchProvider for GoogleSearchProvider {
    fn name(&self) -> &'static str {
        "google-cse"
    }

    async fn search(&self, q: &SearchQuery) -> Result<SearchResponse> {
        // The CSE endpoint caps `num` at 10.
        let max_results = q.max_results.unwrap_or(5).min(10);
        let timeout_ms = timeout_ms_from_query(q);
        let num = max_results.to_string();

        let resp = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.cx.as_str()),
                ("q", q.query.as_str()),
                ("num", num.as_str()),
            ])
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| Error::Search(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Search(format!("google cse HTTP {status}")));
        }

        let parsed: CseSearchResponse = resp
            .json()
            .await
            .map_err(|e| Error::Search(e.to_string()))?;

        let mut out = Vec::new();
        if let Some(items) = parsed.items {
            for item in items.into_iter().take(max_results) {
                let Some(url) = item.link else { continue };
                out.push(SearchResult {
                    title: item.title.unwrap_or_default(),
                    url,
                });
            }
        }

        Ok(SearchResponse {
            results: out,
            provider: "google-cse".to_string(),
        })
    }
}
