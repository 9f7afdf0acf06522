//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! chart clients and the server.

use serde::{Deserialize, Serialize};

use crate::chart::{MarkEntry, MarkMove, Patch};

/// Topic carrying reconciliation patches
pub const TOPIC_SCENE: &str = "scene";
/// Topic carrying fetch failures and skipped ticks
pub const TOPIC_FEED: &str = "feed";
/// Topic carrying server notices
pub const TOPIC_SYSTEM: &str = "system";

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics for real-time updates
    Subscribe {
        /// List of topics to subscribe to (e.g., "scene", "feed")
        topics: Vec<String>,
    },
    /// Unsubscribe from topics
    Unsubscribe {
        /// List of topics to unsubscribe from
        topics: Vec<String>,
    },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A refresh was reconciled into the scene
    ScenePatch {
        cycle: u64,
        added: usize,
        entered: Vec<MarkEntry>,
        updated: Vec<MarkMove>,
        exited: Vec<MarkMove>,
    },
    /// A fetch failed; the scene is unchanged
    RefreshFailed {
        /// Cycle the failed fetch would have produced
        cycle: u64,
        error: String,
    },
    /// A tick was skipped because a fetch was still outstanding
    RefreshSkipped { reason: String },
    /// Server notice
    System { message: String },
    /// Subscription confirmed
    Subscribed {
        /// Topics successfully subscribed to
        topics: Vec<String>,
    },
    /// Unsubscription confirmed
    Unsubscribed {
        /// Topics successfully unsubscribed from
        topics: Vec<String>,
    },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
    /// Connection established
    Connected {
        /// Unique connection identifier
        connection_id: String,
    },
}

/// Internal event for broadcasting through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    /// Topic this event belongs to
    pub topic: String,
    /// The message to send to subscribers
    pub message: ServerMessage,
}

impl WsEvent {
    pub fn scene_patch(patch: Patch) -> Self {
        Self {
            topic: TOPIC_SCENE.to_string(),
            message: ServerMessage::ScenePatch {
                cycle: patch.cycle,
                added: patch.added,
                entered: patch.entered,
                updated: patch.updated,
                exited: patch.exited,
            },
        }
    }

    pub fn refresh_failed(cycle: u64, error: impl ToString) -> Self {
        Self {
            topic: TOPIC_FEED.to_string(),
            message: ServerMessage::RefreshFailed {
                cycle,
                error: error.to_string(),
            },
        }
    }

    pub fn refresh_skipped(reason: impl Into<String>) -> Self {
        Self {
            topic: TOPIC_FEED.to_string(),
            message: ServerMessage::RefreshSkipped {
                reason: reason.into(),
            },
        }
    }

    /// Create a system event
    pub fn system(message: &str) -> Self {
        Self {
            topic: TOPIC_SYSTEM.to_string(),
            message: ServerMessage::System {
                message: message.to_string(),
            },
        }
    }
}
