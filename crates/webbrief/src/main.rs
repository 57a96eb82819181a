use anyhow::Result;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Response};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use webbrief_core::{AnnotatedResult, SearchProvider, SearchQuery};
use webbrief_local::google::GoogleSearchProvider;
use webbrief_local::pipeline::{PageProcessor, Pipeline, PipelineOptions};
use webbrief_local::report;
use webbrief_local::{summarizer_from_env, PageFetcher};

#[derive(Parser, Debug)]
#[command(name = "webbrief")]
#[command(about = "Search the web, summarize each hit, render a report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search and write an HTML report to disk.
    Report(ReportCmd),
    /// Serve the search form and report as a local web app.
    Serve(ServeCmd),
}

#[derive(clap::Args, Debug)]
struct ReportCmd {
    /// Search query (multiple words are joined with spaces).
    #[arg(required = true)]
    query: Vec<String>,
    /// How many search results to process.
    #[arg(long, default_value_t = 5)]
    results: usize,
    /// Where to write the report.
    #[arg(long, default_value = "report.html")]
    out: PathBuf,
    /// Summary length cap, in sentences.
    #[arg(long, default_value_t = 5)]
    max_sentences: usize,
}

#[derive(clap::Args, Debug)]
struct ServeCmd {
    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,
    /// How many search results to process per query.
    #[arg(long, default_value_t = 5)]
    results: usize,
}

/// Process-lifetime wiring: provider, fetcher, and the summarizer backend
/// selected once at startup.
struct App {
    provider: GoogleSearchProvider,
    pipeline: Pipeline,
    results: usize,
}

impl App {
    fn from_env(results: usize, max_sentences: usize) -> webbrief_core::Result<Self> {
        let client = reqwest::Client::new();
        let provider = GoogleSearchProvider::from_env(client.clone())?;
        let summarizer = summarizer_from_env(client);
        let options = PipelineOptions {
            max_sentences,
            ..PipelineOptions::default()
        };
        let processor = PageProcessor::new(Arc::new(PageFetcher::new()?), summarizer, options);
        Ok(Self {
            provider,
            pipeline: Pipeline::new(processor),
            results,
        })
    }

    async fn run_query(&self, query: &str) -> webbrief_core::Result<Vec<AnnotatedResult>> {
        let search = self
            .provider
            .search(&SearchQuery {
                query: query.to_string(),
                max_results: Some(self.results),
                timeout_ms: None,
            })
            .await?;
        info!(
            provider = %search.provider,
            hits = search.results.len(),
            "search finished"
        );
        Ok(self.pipeline.run(&search.results).await)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("webbrief=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Report(cmd) => run_report(cmd).await,
        Commands::Serve(cmd) => run_serve(cmd).await,
    }
}

async fn run_report(cmd: ReportCmd) -> Result<()> {
    let app = App::from_env(cmd.results, cmd.max_sentences)?;
    let query = cmd.query.join(" ");
    let annotated = app.run_query(&query).await?;
    let html = report::render_report(&query, &annotated);
    std::fs::write(&cmd.out, html)?;
    println!("Report saved to {}", cmd.out.display());
    Ok(())
}

async fn run_serve(cmd: ServeCmd) -> Result<()> {
    let app = App::from_env(cmd.results, PipelineOptions::default().max_sentences)?;
    let router = axum::Router::new()
        .route("/", axum::routing::get(index))
        .with_state(Arc::new(app));
    let listener = tokio::net::TcpListener::bind(cmd.addr).await?;
    info!(addr = %cmd.addr, "serving");
    axum::serve(listener, router).await?;
    Ok(())
}

#[derive(serde::Deserialize)]
struct IndexParams {
    q: Option<String>,
}

async fn index(State(app): State<Arc<App>>, Query(params): Query<IndexParams>) -> Response {
    let query = params
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());
    match query {
        None => Html(report::render_serve_page(None)).into_response(),
        Some(q) => match app.run_query(&q).await {
            Ok(annotated) => Html(report::render_serve_page(Some((
                q.as_str(),
                annotated.as_slice(),
            ))))
            .into_response(),
            // Provider-level failures are fatal to this request, not rendered
            // as a half-empty report.
            Err(e) => (
                axum::http::StatusCode::BAD_GATEWAY,
                format!("search failed: {e}"),
            )
                .into_response(),
        },
    }
}
