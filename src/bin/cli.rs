//! Vowelscope CLI
//!
//! Command-line interface for Vowelscope operations:
//! - Render the chart once
//! - Run the demo word source
//! - Print the default config
//! - Check a running server

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use vowelscope::chart::{ChartView, Layout};
use vowelscope::config::{self, Config};
use vowelscope::feed::{FeedClient, RecordSource};
use vowelscope::source::{self, DocumentStore};

#[derive(Parser)]
#[command(name = "vowelscope-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tools for the Vowelscope live word scatter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch once and write the settled chart as SVG
    Once {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the demo word source
    Source {
        /// Word list, one word per line
        #[arg(short, long)]
        words: Option<PathBuf>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show feed status of a running server
    Status {
        /// API server URL
        #[arg(long, default_value = "http://localhost:8090")]
        api_url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Once { output } => {
            let config = load(&cli.config)?;
            let client = FeedClient::new(&config.upstream)?;
            let records = client
                .fetch()
                .await
                .with_context(|| format!("fetching {}", client.url()))?;

            let layout = Layout::from_config(&config.chart);
            let settled = Instant::now() + layout.transition;
            let mut view = ChartView::new(layout);
            let patch = view.apply(records, Instant::now());
            let svg = view.render_svg(settled);

            match output {
                Some(path) => {
                    std::fs::write(&path, &svg)
                        .with_context(|| format!("writing {:?}", path))?;
                    eprintln!("{} words written to {:?}", patch.entered.len(), path);
                }
                None => println!("{}", svg),
            }
        }

        Commands::Source { words, port } => {
            let mut config = load(&cli.config)?;
            if let Some(words) = words {
                config.source.words_file = words;
            }
            if let Some(port) = port {
                config.source.port = port;
            }

            let store = Arc::new(DocumentStore::new(config.source.max_documents));
            let cancel = CancellationToken::new();

            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Ctrl+C received, stopping word source");
                }
                on_signal.cancel();
            });

            source::serve(&config.source, store, cancel).await?;
        }

        Commands::Config { output } => {
            let content = config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &content)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", content);
                }
            }
        }

        Commands::Status { api_url } => {
            let client = reqwest::Client::new();
            let response = client
                .get(format!("{}/api/v1/feed/status", api_url))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let status: serde_json::Value = resp.json().await?;
                    print_status(&status);
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Vowelscope at {}", api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the server is running:");
                    eprintln!("  cargo run --bin vowelscope");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn load(path: &Option<PathBuf>) -> anyhow::Result<Config> {
    let resolved = Config::resolve(path.as_deref()).context("loading configuration")?;
    vowelscope::logging::init(&resolved.config.logging);
    resolved.log();
    Ok(resolved.config)
}

fn print_status(status: &serde_json::Value) {
    let text = |key: &str| status[key].as_str().unwrap_or("-").to_string();
    let count = |key: &str| status[key].as_u64().unwrap_or(0);

    println!("Vowelscope v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Source:    {}", text("source"));
    println!(
        "Poller:    {} (every {} ms, overlap {})",
        if status["running"].as_bool().unwrap_or(false) {
            "running"
        } else {
            "stopped"
        },
        count("interval_ms"),
        text("overlap")
    );
    println!("Cycle:     {}", count("cycle"));
    println!("Records:   {} ({} new last cycle)", count("records"), count("last_added"));
    println!();
    println!(
        "Fetches:   {} started, {} ok, {} failed, {} skipped, {} cancelled",
        count("fetches_started"),
        count("successes"),
        count("failures"),
        count("skipped"),
        count("cancelled")
    );
    println!("Last ok:   {}", text("last_success"));
    if let Some(error) = status["last_error"].as_str() {
        println!("Last error: {} ({})", error, text("last_error_at"));
    }
}
