//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chart::{Baseline, MarkView};

// ============================================
// RECORD DTOs
// ============================================

/// One held record with its slot on the canvas
#[derive(Debug, Serialize)]
pub struct RecordDto {
    /// Record identifier
    pub id: String,
    pub word: String,
    /// Vowel fraction in [0, 1]
    pub fraction: f64,
    /// Plotting index, 0 = leftmost
    pub index: usize,
    /// Settled horizontal position
    pub x: f64,
}

/// Held snapshot response
#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    /// Refresh cycle that produced the snapshot (0 = nothing fetched yet)
    pub cycle: u64,
    /// Identifiers new in that cycle
    pub added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_at: Option<DateTime<Utc>>,
    pub count: usize,
    /// Records in plotting order
    pub records: Vec<RecordDto>,
}

// ============================================
// SCENE DTOs
// ============================================

/// Scene query parameters
#[derive(Debug, Default, Deserialize)]
pub struct SceneParams {
    /// Only marks in this state: "active" or "exiting"
    #[serde(default)]
    pub state: Option<String>,
}

/// Current scene response
#[derive(Debug, Serialize)]
pub struct SceneResponse {
    pub cycle: u64,
    pub width: f64,
    pub height: f64,
    pub baseline: Baseline,
    /// Marks that are not exiting
    pub live: usize,
    /// Marks sliding out
    pub exiting: usize,
    /// Marks at the time of the request, in paint order
    pub marks: Vec<MarkView>,
}

// ============================================
// FEED DTOs
// ============================================

/// Response to a manual refresh request
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Status: "accepted"
    pub status: String,
    /// Cycle held when the request was accepted
    pub cycle: u64,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, degraded, starting
    pub status: String,
    /// Feed status: ok, failing, waiting
    pub feed: String,
    /// Poller loop running
    pub poller_running: bool,
    /// Open WebSocket connections
    pub websocket_connections: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
