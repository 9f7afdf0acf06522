//! # Vowelscope
//!
//! Live word scatter: polls a document collection every few seconds and
//! keeps a keyed 1-D scatter plot of the returned words in sync with it.
//! Each word is a circle whose height is its vowel fraction; new words slide
//! in from the right, known words slide to their new slot, vanished words
//! slide out to the left and are removed.
//!
//! ## Modules
//!
//! - [`records`]: Records, identifiers and the held snapshot
//! - [`chart`]: Scales, layout, scene, reconciler and SVG rendering
//! - [`feed`]: Upstream query, HTTP client, refresh and the polling loop
//! - [`api`]: HTTP server with Axum
//! - [`websocket`]: Scene patch streaming
//! - [`source`]: Demo upstream serving random dictionary words
//! - [`config`]: TOML configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vowelscope::chart::ChartView;
//! use vowelscope::records::Record;
//! use std::time::Instant;
//!
//! let mut view = ChartView::default();
//!
//! // Response order is newest first
//! let patch = view.apply(
//!     vec![
//!         Record::new("b2", "banana", 0.5),
//!         Record::new("a1", "apple", 0.4),
//!     ],
//!     Instant::now(),
//! );
//! assert_eq!(patch.added, 2);
//!
//! let svg = view.render_svg(Instant::now());
//! println!("{}", svg);
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod feed;
pub mod logging;
pub mod records;
pub mod source;
pub mod websocket;

// Re-export top-level types for convenience
pub use records::{QueryResponse, Record, RecordId, Snapshot, Vowels};

pub use chart::{ChartView, Layout, Patch, Scene};

pub use feed::{refresh, FeedClient, FeedError, FeedStatus, Poller, RecordQuery, RecordSource};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{
    websocket_handler, ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, WsEvent,
};

pub use config::{
    ApiConfig, ChartConfig, Config, ConfigError, LoggingConfig, OverlapPolicy, PollerConfig,
    Resolved, SourceConfig, UpstreamConfig,
};

pub use source::{DocumentStore, SourceError, WordGenerator};
