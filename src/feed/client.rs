//! Upstream HTTP client
//!
//! Issues the collection query and decodes the `result.data` envelope.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::query::RecordQuery;
use super::{FeedError, RecordSource};
use crate::config::UpstreamConfig;
use crate::records::{QueryResponse, Record};

/// HTTP record source
pub struct FeedClient {
    client: Client,
    base_url: String,
    query: RecordQuery,
}

impl FeedClient {
    /// Create a client from the upstream configuration
    pub fn new(config: &UpstreamConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("vowelscope/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            query: RecordQuery::from_config(config),
        })
    }

    pub fn query(&self) -> &RecordQuery {
        &self.query
    }

    /// Full URL of the collection query
    pub fn url(&self) -> String {
        self.query.url(&self.base_url)
    }
}

#[async_trait]
impl RecordSource for FeedClient {
    fn describe(&self) -> String {
        format!("{}{}", self.base_url, self.query.collection_path)
    }

    async fn fetch(&self) -> Result<Vec<Record>, FeedError> {
        let url = self.url();
        tracing::debug!(url = %url, "Fetching records");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(FeedError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(FeedError::from_transport)?;
        let decoded: QueryResponse =
            serde_json::from_slice(&body).map_err(|e| FeedError::Decode(e.to_string()))?;

        Ok(decoded.into_records())
    }
}
