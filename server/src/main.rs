use anyhow::Result;
use clap::Parser;
use dnf::SearchConfig;
use server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus JSON file of compiled documents
    #[arg(long, default_value = "./corpus.json")]
    corpus: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Worker threads for predicate evaluation (overrides DNF_MAX_WORKERS)
    #[arg(long)]
    max_workers: Option<usize>,
    /// Per-search deadline in milliseconds (overrides DNF_TIMEOUT_MS)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let mut config = SearchConfig::from_env();
    if let Some(n) = args.max_workers {
        config = config.with_max_workers(n);
    }
    if let Some(ms) = args.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    tracing::info!(?config, "search config");

    let app = build_app(args.corpus, config)?;
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
