//! Record Feed
//!
//! Fetches the record collection on an interval and drives the chart:
//! - `RecordQuery`: the fixed collection query (filter, limit, sort)
//! - `FeedClient`: HTTP implementation of `RecordSource`
//! - `refresh`: builds the next held snapshot from a response
//! - `Poller`: timer loop with an overlap guard and cancellation

mod client;
mod poller;
mod query;
mod refresh;

pub use client::FeedClient;
pub use poller::{FeedStatus, Poller};
pub use query::RecordQuery;
pub use refresh::refresh;

use async_trait::async_trait;
use thiserror::Error;

use crate::records::Record;

/// Anything that can produce the current record collection, newest first
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Human-readable description for logs
    fn describe(&self) -> String;

    /// Fetch the current collection
    async fn fetch(&self) -> Result<Vec<Record>, FeedError>;
}

/// Errors that can occur while fetching records
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Fetch cancelled")]
    Cancelled,
}

impl FeedError {
    /// Classify a transport error from the HTTP client
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout
        } else if err.is_connect() {
            FeedError::Unavailable(err.to_string())
        } else {
            FeedError::Request(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FeedError::Status {
            status: 503,
            message: "down".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream returned 503: down");
        assert_eq!(FeedError::Cancelled.to_string(), "Fetch cancelled");
    }
}
