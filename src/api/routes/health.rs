//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (a refresh has been applied)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Returns 200 once the first refresh has been applied, 503 before.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.feed_status.read().await.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let feed = state.feed_status.read().await.clone();

    // The last outcome decides between ok and failing
    let failing = match (&feed.last_error_at, &feed.last_success) {
        (Some(err), Some(ok)) => err > ok,
        (Some(_), None) => true,
        _ => false,
    };

    let (status, feed_status) = if !feed.is_ready() && !failing {
        ("starting", "waiting")
    } else if failing {
        ("degraded", "failing")
    } else {
        ("healthy", "ok")
    };

    Json(HealthResponse {
        status: status.to_string(),
        feed: feed_status.to_string(),
        poller_running: feed.running,
        websocket_connections: state.ws_connection_count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }
}
