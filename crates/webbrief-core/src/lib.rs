use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("search failed: {0}")]
    Search(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("summarize failed: {0}")]
    Summarize(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: Option<usize>,
    /// Timeout for the provider call (network + parsing).
    pub timeout_ms: Option<u64>,
}

/// One ranked hit from a search provider. Ordering reflects provider
/// relevance rank and is preserved through the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub provider: String,
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, q: &SearchQuery) -> Result<SearchResponse>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the operation (network + body read).
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
}

impl FetchRequest {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn parsed_url(&self) -> Result<url::Url> {
        url::Url::parse(&self.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.url)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

impl FetchResponse {
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }
}

#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

/// Summarization capability. Selected once at process start; callers hold a
/// single `Arc<dyn Summarizer>` and never branch on which backend is live.
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &'static str;
    async fn summarize(&self, text: &str, max_sentences: usize) -> Result<String>;
}

/// Per-item outcome: a computed summary, or a captured failure message.
/// Rendering branches on the tag, never on a caught error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum SummaryOutcome {
    Summary(String),
    Failed(String),
}

impl SummaryOutcome {
    pub fn text(&self) -> &str {
        match self {
            SummaryOutcome::Summary(s) => s,
            SummaryOutcome::Failed(s) => s,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SummaryOutcome::Failed(_))
    }
}

/// A `SearchResult` after page processing. Produced exactly once per input
/// item; `title` and `url` pass through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnotatedResult {
    pub title: String,
    pub url: String,
    pub summary: SummaryOutcome,
}

impl AnnotatedResult {
    pub fn new(result: &SearchResult, summary: SummaryOutcome) -> Self {
        Self {
            title: result.title.clone(),
            url: result.url.clone(),
            summary,
        }
    }
}
