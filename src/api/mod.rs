//! Vowelscope HTTP API
//!
//! Serves the live chart and the state behind it, built with Axum.
//!
//! # Endpoints
//!
//! ## Chart
//! - `GET /` - Page embedding the live chart
//! - `GET /chart.svg` - Current scene as SVG
//!
//! ## Data
//! - `GET /api/v1/records` - Held snapshot in plotting order
//! - `GET /api/v1/records/:id` - One held record
//! - `GET /api/v1/scene` - Marks with current and target positions
//!
//! ## Feed
//! - `GET /api/v1/feed/status` - Poller counters and last error
//! - `POST /api/v1/feed/refresh` - Request an immediate refresh
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /ws` - Scene patches and feed events
//!
//! # Example
//!
//! ```rust,ignore
//! use vowelscope::api::{serve, AppState};
//! use vowelscope::config::Config;
//! use vowelscope::feed::{FeedClient, Poller};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = Config::default();
//! let source = Arc::new(FeedClient::new(&config.upstream)?);
//! let poller = Poller::new(source, view, hub, config.poller.clone());
//! let state = AppState::from_poller(&poller, config);
//!
//! let cancel = CancellationToken::new();
//! poller.spawn(cancel.clone());
//! serve(state, cancel).await?;
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use crate::config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::{websocket_handler, WsEvent};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/records", get(routes::feed::list_records))
        .route("/records/:id", get(routes::feed::get_record))
        .route("/scene", get(routes::feed::get_scene))
        .route("/feed/status", get(routes::feed::feed_status))
        .route("/feed/refresh", post(routes::feed::trigger_refresh));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::chart::index))
        .route("/chart.svg", get(routes::chart::chart_svg))
        .route("/ws", get(websocket_handler))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server
///
/// Stops on Ctrl+C, SIGTERM or when `cancel` fires; a signal also cancels
/// `cancel` so the poller stops with the server.
pub async fn serve(state: AppState, cancel: CancellationToken) -> Result<(), ApiError> {
    let addr = state.config.api.addr();
    let hub = Arc::clone(&state.ws_hub);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Vowelscope API listening on {}", addr);

    let shutdown = cancel.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_signal() => {
                    hub.publish(WsEvent::system("server shutting down")).await;
                    shutdown.cancel();
                }
                _ = shutdown.cancelled() => {}
            }
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Vowelscope API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartView;
    use crate::config::Config;
    use crate::feed::FeedStatus;
    use crate::records::Record;
    use crate::websocket::ConnectionHub;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use std::time::Instant;
    use tokio::sync::{Notify, RwLock};
    use tower::util::ServiceExt;

    struct TestApp {
        router: Router,
        status: Arc<RwLock<FeedStatus>>,
        refresh: Arc<Notify>,
    }

    fn create_test_app(response: &[(&str, &str, f64)]) -> TestApp {
        let mut view = ChartView::default();
        if !response.is_empty() {
            let records = response
                .iter()
                .map(|(id, word, fraction)| Record::new(*id, *word, *fraction))
                .collect();
            view.apply(records, Instant::now());
        }

        let status = Arc::new(RwLock::new(FeedStatus::default()));
        let refresh = Arc::new(Notify::new());
        let state = AppState::new(
            Arc::new(RwLock::new(view)),
            Arc::clone(&status),
            Arc::clone(&refresh),
            Arc::new(ConnectionHub::default()),
            Config::default(),
        );

        TestApp {
            router: build_router(state),
            status,
            refresh,
        }
    }

    async fn send(app: &TestApp, method: &str, uri: &str) -> axum::response::Response {
        app.router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app(&[]);
        let response = send(&app, "GET", "/health/live").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_after_first_refresh() {
        let app = create_test_app(&[]);

        let response = send(&app, "GET", "/health/ready").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        app.status.write().await.successes = 1;
        let response = send(&app, "GET", "/health/ready").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app(&[]);

        let response = send(&app, "GET", "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "starting");
        assert_eq!(body["feed"], "waiting");
        assert_eq!(body["websocket_connections"], 0);
    }

    #[tokio::test]
    async fn test_records_in_plotting_order() {
        let app = create_test_app(&[("c3", "cherry", 0.33), ("b2", "banana", 0.5), ("a1", "apple", 0.4)]);

        let response = send(&app, "GET", "/api/v1/records").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["cycle"], 1);
        assert_eq!(body["added"], 3);
        assert_eq!(body["count"], 3);
        assert_eq!(body["records"][0]["word"], "apple");
        assert_eq!(body["records"][0]["x"], 0.0);
        assert_eq!(body["records"][2]["word"], "cherry");
        assert_eq!(body["records"][2]["x"], 20.0);
    }

    #[tokio::test]
    async fn test_get_record() {
        let app = create_test_app(&[("b2", "banana", 0.5), ("a1", "apple", 0.4)]);

        let response = send(&app, "GET", "/api/v1/records/b2").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["index"], 1);

        let response = send(&app, "GET", "/api/v1/records/zz").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_scene() {
        let app = create_test_app(&[("b2", "banana", 0.5), ("a1", "apple", 0.4)]);

        let response = send(&app, "GET", "/api/v1/scene").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["live"], 2);
        assert_eq!(body["exiting"], 0);
        assert_eq!(body["width"], 999.0);
        assert_eq!(body["baseline"]["y"], 39.5);
        assert_eq!(body["marks"].as_array().unwrap().len(), 2);

        let response = send(&app, "GET", "/api/v1/scene?state=exiting").await;
        let body = body_json(response).await;
        assert!(body["marks"].as_array().unwrap().is_empty());

        let response = send(&app, "GET", "/api/v1/scene?state=bogus").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chart_svg() {
        let app = create_test_app(&[("a1", "apple", 0.4)]);

        let response = send(&app, "GET", "/chart.svg").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "image/svg+xml"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let svg = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(svg.contains("<circle"));
        assert!(svg.contains("<title>apple</title>"));
    }

    #[tokio::test]
    async fn test_index_page() {
        let app = create_test_app(&[]);
        let response = send(&app, "GET", "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_refresh_requires_running_poller() {
        let app = create_test_app(&[]);

        let response = send(&app, "POST", "/api/v1/feed/refresh").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        app.status.write().await.running = true;
        let response = send(&app, "POST", "/api/v1/feed/refresh").await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        // The stored permit completes immediately
        tokio::time::timeout(std::time::Duration::from_secs(1), app.refresh.notified())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_feed_status() {
        let app = create_test_app(&[]);
        app.status.write().await.failures = 2;

        let response = send(&app, "GET", "/api/v1/feed/status").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["failures"], 2);
        assert_eq!(body["overlap"], "skip");
    }
}
