//! Vowelscope Server
//!
//! Polls the upstream collection and serves the live chart.
//!
//! Run with: cargo run --bin vowelscope -- --config vowelscope.toml
//!
//! # Configuration
//!
//! See `vowelscope-cli config` for the file format. Environment variables:
//! - `VOWELSCOPE_UPSTREAM_URL`: Upstream base URL (default: http://localhost:8080)
//! - `VOWELSCOPE_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `VOWELSCOPE_API_PORT`: Port to listen on (default: 8090)
//! - `VOWELSCOPE_POLL_INTERVAL_MS`: Refresh interval (default: 5000)
//! - `RUST_LOG`: Log filter (overrides the configured level)

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use vowelscope::api::{serve, AppState};
use vowelscope::chart::{ChartView, Layout};
use vowelscope::config::Config;
use vowelscope::feed::{FeedClient, Poller, RecordSource};
use vowelscope::websocket::{ConnectionHub, HubConfig};

#[derive(Parser)]
#[command(name = "vowelscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live scatter plot of words by vowel fraction")]
struct Args {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let resolved = Config::resolve(args.config.as_deref()).context("loading configuration")?;

    vowelscope::logging::init(&resolved.config.logging);
    tracing::info!("Starting Vowelscope v{}", env!("CARGO_PKG_VERSION"));
    resolved.log();
    let config = resolved.config;

    let client = FeedClient::new(&config.upstream).context("building upstream client")?;
    tracing::info!(url = %client.url(), "Upstream query");

    let source: Arc<dyn RecordSource> = Arc::new(client);
    let view = Arc::new(RwLock::new(ChartView::new(Layout::from_config(&config.chart))));
    let hub = Arc::new(ConnectionHub::new(HubConfig::default()));

    let poller = Poller::new(source, view, hub, config.poller.clone());
    let state = AppState::from_poller(&poller, config);

    let cancel = CancellationToken::new();
    let poller_handle = poller.spawn(cancel.clone());

    let result = serve(state, cancel.clone()).await;

    cancel.cancel();
    if let Err(e) = poller_handle.await {
        tracing::warn!(error = %e, "Poller task failed");
    }

    result.context("running API server")?;
    tracing::info!("Vowelscope stopped");
    Ok(())
}
