//! Demo word source
//!
//! A small stand-in for the document-store REST service the chart polls.
//! A [`WordGenerator`] inserts random dictionary words, each annotated with
//! its vowel statistics, into an in-memory [`DocumentStore`]; [`router`]
//! serves them through the collection query endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use vowelscope::config::SourceConfig;
//! use vowelscope::source::{self, DocumentStore};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = SourceConfig::default();
//! let store = Arc::new(DocumentStore::new(config.max_documents));
//! source::serve(&config, store, CancellationToken::new()).await?;
//! ```

mod filter;
mod generator;
mod routes;
mod store;
mod vowels;

pub use filter::{lookup, Direction, Filter, SortSpec};
pub use generator::{load_words, WordGenerator};
pub use routes::{router, CollectionParams};
pub use store::{Document, DocumentStore};
pub use vowels::{count_vowels, vowel_fraction, vowel_stats, VOWELS};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::SourceConfig;

/// Demo source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read word list {path}: {error}")]
    WordList { path: PathBuf, error: String },

    #[error("Word list {0} contains no words")]
    EmptyWordList(PathBuf),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid sort: {0}")]
    InvalidSort(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for SourceError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            SourceError::InvalidFilter(_) => (StatusCode::BAD_REQUEST, "INVALID_FILTER"),
            SourceError::InvalidSort(_) => (StatusCode::BAD_REQUEST, "INVALID_SORT"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        tracing::warn!(error_code = %code, error_message = %self, "Source request failed");

        let body = json!({ "error": { "code": code, "message": self.to_string() } });
        (status, Json(body)).into_response()
    }
}

/// Run the word generator and serve the store until cancelled
pub async fn serve(
    config: &SourceConfig,
    store: Arc<DocumentStore>,
    cancel: CancellationToken,
) -> Result<(), SourceError> {
    let words = load_words(&config.words_file)?;
    let generator = WordGenerator::new(
        Arc::clone(&store),
        words,
        Duration::from_millis(config.max_pause_ms),
    )?;
    let generator_task = tokio::spawn(generator.run(cancel.child_token()));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Word source listening on {}", addr);

    let shutdown = cancel.clone();
    axum::serve(listener, router(store))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    cancel.cancel();
    if let Err(e) = generator_task.await {
        tracing::warn!(error = %e, "Word generator task failed");
    }

    tracing::info!("Word source shut down");
    Ok(())
}
