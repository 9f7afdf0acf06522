//! Demo source HTTP routes
//!
//! - GET /service/mongo/:host/:db/:collection?query=..&limit=..&sort=..
//!
//! Responds with `{"result": {"data": [...]}}`.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::filter::{Filter, SortSpec};
use super::store::DocumentStore;
use super::SourceError;

/// Query string of a collection request; JSON-encoded values
#[derive(Debug, Default, Deserialize)]
pub struct CollectionParams {
    pub query: Option<String>,
    pub limit: Option<usize>,
    pub sort: Option<String>,
}

/// Build the demo source router
pub fn router(store: Arc<DocumentStore>) -> Router {
    Router::new()
        .route("/service/mongo/:host/:db/:collection", get(find))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}

/// GET /service/mongo/:host/:db/:collection
async fn find(
    State(store): State<Arc<DocumentStore>>,
    Path((host, db, collection)): Path<(String, String, String)>,
    Query(params): Query<CollectionParams>,
) -> Result<Json<Value>, SourceError> {
    let filter = match params.query.as_deref() {
        Some(raw) => Filter::parse(&parse_json(raw, SourceError::InvalidFilter)?)?,
        None => Filter::All,
    };
    let sort = match params.sort.as_deref() {
        Some(raw) => SortSpec::parse(&parse_json(raw, SourceError::InvalidSort)?)?,
        None => SortSpec::default(),
    };
    let limit = params.limit.unwrap_or(0);

    let data = store.query(&filter, &sort, limit).await;
    tracing::debug!(
        host = %host,
        db = %db,
        collection = %collection,
        returned = data.len(),
        "Served collection query"
    );

    Ok(Json(json!({ "result": { "data": data } })))
}

fn parse_json(raw: &str, err: fn(String) -> SourceError) -> Result<Value, SourceError> {
    serde_json::from_str(raw).map_err(|e| err(e.to_string()))
}
