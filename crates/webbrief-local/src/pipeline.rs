use futures_util::{stream, StreamExt};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use webbrief_core::{
    AnnotatedResult, Error, FetchBackend, FetchRequest, Result, SearchResult, SummaryOutcome,
    Summarizer,
};

use crate::extract;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Summary length cap handed to the active summarizer backend.
    pub max_sentences: usize,
    /// Per-page fetch timeout.
    pub timeout_ms: u64,
    /// Hard cap on bytes read per page body.
    pub max_bytes: u64,
    /// Politeness pace toward the fetch collaborator, shared across workers.
    pub requests_per_minute: u32,
    /// Concurrent page workers. Output order is input order regardless.
    pub concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_sentences: 5,
            timeout_ms: 20_000,
            max_bytes: 2_000_000,
            requests_per_minute: 60,
            concurrency: 4,
        }
    }
}

/// Global pace limiter for outbound page fetches.
pub struct FetchRateLimiter {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    requests_per_minute: u32,
}

impl FetchRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let rpm = if requests_per_minute == 0 {
            60
        } else {
            requests_per_minute
        };
        // Burst of one: cells refill strictly one fetch-interval apart, the
        // same pacing as a fixed inter-request delay.
        let period = Duration::from_secs_f64(60.0 / f64::from(rpm));
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_minute(NonZeroU32::new(60).unwrap()));
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            requests_per_minute: rpm,
        }
    }

    /// Wait until the next request is allowed.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
}

/// Per-result orchestrator: fetch one page, extract its text, summarize.
///
/// `process` is the system's sole error-isolation boundary. Every failure
/// underneath it is captured into the item's `SummaryOutcome`; nothing
/// propagates to sibling items. There is no retry.
pub struct PageProcessor {
    fetcher: Arc<dyn FetchBackend>,
    summarizer: Arc<dyn Summarizer>,
    options: PipelineOptions,
}

impl PageProcessor {
    pub fn new(
        fetcher: Arc<dyn FetchBackend>,
        summarizer: Arc<dyn Summarizer>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            fetcher,
            summarizer,
            options,
        }
    }

    pub async fn process(&self, result: &SearchResult) -> AnnotatedResult {
        match self.try_process(result).await {
            Ok(summary) => {
                debug!(url = %result.url, "page summarized");
                AnnotatedResult::new(result, SummaryOutcome::Summary(summary))
            }
            Err(e) => {
                warn!(url = %result.url, error = %e, "page processing failed");
                AnnotatedResult::new(result, SummaryOutcome::Failed(format!("Failed to fetch: {e}")))
            }
        }
    }

    async fn try_process(&self, result: &SearchResult) -> Result<String> {
        let req = FetchRequest {
            url: result.url.clone(),
            timeout_ms: Some(self.options.timeout_ms),
            max_bytes: Some(self.options.max_bytes),
        };
        let resp = self.fetcher.fetch(&req).await?;
        if !(200..300).contains(&resp.status) {
            return Err(Error::Fetch(format!("HTTP {} for {}", resp.status, result.url)));
        }
        let text = extract::extract_text(&resp.text_lossy());
        self.summarizer.summarize(&text, self.options.max_sentences).await
    }
}

/// Drives the `PageProcessor` over an ordered search-result list.
///
/// Output is slotted by input index (an order-preserving buffered stream),
/// never by completion order, and has exactly the input's length: a failed
/// item is annotated in place, not dropped.
pub struct Pipeline {
    processor: PageProcessor,
    limiter: FetchRateLimiter,
    concurrency: usize,
}

impl Pipeline {
    pub fn new(processor: PageProcessor) -> Self {
        let (requests_per_minute, concurrency) = {
            let o = &processor.options;
            (o.requests_per_minute, o.concurrency)
        };
        Self {
            processor,
            limiter: FetchRateLimiter::new(requests_per_minute),
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run(&self, results: &[SearchResult]) -> Vec<AnnotatedResult> {
        info!(items = results.len(), "pipeline run started");
        let annotated: Vec<AnnotatedResult> = stream::iter(results.to_vec())
            .map(|r| async move { self.process_item(&r).await })
            .buffered(self.concurrency)
            .collect()
            .await;
        let failed = annotated.iter().filter(|a| a.summary.is_failed()).count();
        info!(items = annotated.len(), failed, "pipeline run finished");
        annotated
    }

    async fn process_item(&self, result: &SearchResult) -> AnnotatedResult {
        self.limiter.wait().await;
        self.processor.process(result).await
    }
}
