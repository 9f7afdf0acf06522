//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Notify, RwLock};

use crate::chart::ChartView;
use crate::config::Config;
use crate::feed::{FeedStatus, Poller};
use crate::websocket::ConnectionHub;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Held snapshot and scene; written only by the poller
    pub view: Arc<RwLock<ChartView>>,
    /// Poller counters
    pub feed_status: Arc<RwLock<FeedStatus>>,
    /// Wakes the poller for an immediate refresh
    pub refresh: Arc<Notify>,
    /// WebSocket connection hub for real-time streaming
    pub ws_hub: Arc<ConnectionHub>,
    /// Full configuration
    pub config: Arc<Config>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        view: Arc<RwLock<ChartView>>,
        feed_status: Arc<RwLock<FeedStatus>>,
        refresh: Arc<Notify>,
        ws_hub: Arc<ConnectionHub>,
        config: Config,
    ) -> Self {
        Self {
            view,
            feed_status,
            refresh,
            ws_hub,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// State sharing the poller's view, status, trigger and hub
    pub fn from_poller(poller: &Poller, config: Config) -> Self {
        Self::new(
            poller.view(),
            poller.status(),
            poller.trigger(),
            poller.hub(),
            config,
        )
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }
}
