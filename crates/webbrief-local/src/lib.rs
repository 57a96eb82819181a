use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use webbrief_core::{Error, FetchBackend, FetchRequest, FetchResponse, Result, Summarizer};

pub mod deepseek;
pub mod extract;
pub mod google;
pub mod pipeline;
pub mod report;
pub mod summarize;

pub use deepseek::DeepseekSummarizer;
pub use summarize::FrequencySummarizer;

const USER_AGENT: &str = concat!("webbrief/", env!("CARGO_PKG_VERSION"));

/// Plain reqwest page fetcher with an identifying User-Agent.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            // Safety defaults: avoid "hang forever" on DNS/TLS/body stalls.
            // Per-request timeouts (FetchRequest.timeout_ms) can still override this.
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl FetchBackend for PageFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let url = req.parsed_url()?;

        let mut rb = self.client.get(url);
        if let Some(to) = req.timeout() {
            rb = rb.timeout(to);
        }
        let resp = rb.send().await.map_err(|e| Error::Fetch(e.to_string()))?;
        let final_url = resp.url().to_string();
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let max_bytes = req.max_bytes.unwrap_or(u64::MAX) as usize;
        let mut truncated = false;
        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Fetch(e.to_string()))?;
            if bytes.len().saturating_add(chunk.len()) > max_bytes {
                let can_take = max_bytes.saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..can_take]);
                truncated = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FetchResponse {
            url: req.url.clone(),
            final_url,
            status,
            content_type,
            bytes,
            truncated,
        })
    }
}

/// Select the summarization backend, once, at process start.
///
/// Probes the external client; any construction failure (missing key,
/// whatever else) silently degrades to the local frequency summarizer.
/// Callers never learn which backend is live except through `name()`.
pub fn summarizer_from_env(client: reqwest::Client) -> Arc<dyn Summarizer> {
    match DeepseekSummarizer::from_env(client) {
        Ok(s) => {
            debug!(backend = s.name(), "external summarizer configured");
            Arc::new(s)
        }
        Err(e) => {
            debug!(reason = %e, "external summarizer unavailable; using frequency fallback");
            Arc::new(FrequencySummarizer::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::header, routing::get, Router};
    use std::net::SocketAddr;

    async fn spawn_fixture(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn fetcher_sends_identifying_user_agent() {
        let app = Router::new().route(
            "/",
            get(|headers: axum::http::HeaderMap| async move {
                let ua = headers
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                ua
            }),
        );
        let addr = spawn_fixture(app).await;

        let fetcher = PageFetcher::new().unwrap();
        let req = FetchRequest {
            url: format!("http://{addr}/"),
            timeout_ms: Some(2_000),
            max_bytes: None,
        };
        let resp = fetcher.fetch(&req).await.unwrap();
        assert_eq!(resp.status, 200);
        assert!(resp.text_lossy().starts_with("webbrief/"));
    }

    #[tokio::test]
    async fn fetcher_truncates_bodies_at_max_bytes() {
        let app = Router::new().route("/", get(|| async { "x".repeat(10_000) }));
        let addr = spawn_fixture(app).await;

        let fetcher = PageFetcher::new().unwrap();
        let req = FetchRequest {
            url: format!("http://{addr}/"),
            timeout_ms: Some(2_000),
            max_bytes: Some(100),
        };
        let resp = fetcher.fetch(&req).await.unwrap();
        assert!(resp.truncated);
        assert_eq!(resp.bytes.len(), 100);
    }

    #[tokio::test]
    async fn fetcher_reports_connection_failures_as_fetch_errors() {
        let fetcher = PageFetcher::new().unwrap();
        // Port 1 is essentially never bound; connection is refused fast.
        let req = FetchRequest {
            url: "http://127.0.0.1:1/".to_string(),
            timeout_ms: Some(2_000),
            max_bytes: None,
        };
        let err = fetcher.fetch(&req).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)), "got {err:?}");
    }

    #[test]
    fn summarizer_selection_falls_back_without_a_key() {
        // Scope the probe away from any ambient DeepSeek configuration.
        let prev_scoped = std::env::var("WEBBRIEF_DEEPSEEK_API_KEY").ok();
        let prev_plain = std::env::var("DEEPSEEK_API_KEY").ok();
        std::env::remove_var("WEBBRIEF_DEEPSEEK_API_KEY");
        std::env::remove_var("DEEPSEEK_API_KEY");

        let summarizer = summarizer_from_env(reqwest::Client::new());
        assert_eq!(summarizer.name(), "frequency");

        if let Some(v) = prev_scoped {
            std::env::set_var("WEBBRIEF_DEEPSEEK_API_KEY", v);
        }
        if let Some(v) = prev_plain {
            std::env::set_var("DEEPSEEK_API_KEY", v);
        }
    }
}
