//! Feed Routes
//!
//! - GET /api/v1/records - Held snapshot in plotting order
//! - GET /api/v1/records/:id - One held record
//! - GET /api/v1/scene - Marks with current and target positions
//! - GET /api/v1/feed/status - Poller counters
//! - POST /api/v1/feed/refresh - Request an immediate refresh

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use std::time::Instant;

use crate::api::dto::{RecordDto, RecordsResponse, RefreshResponse, SceneParams, SceneResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::chart::{Layout, MarkState};
use crate::feed::FeedStatus;
use crate::records::Record;

fn record_dto(layout: &Layout, index: usize, record: &Record) -> RecordDto {
    RecordDto {
        id: record.id.to_string(),
        word: record.word.clone(),
        fraction: record.fraction(),
        index,
        x: layout.x_at(index as f64),
    }
}

/// GET /api/v1/records
pub async fn list_records(State(state): State<Arc<AppState>>) -> Json<RecordsResponse> {
    let view = state.view.read().await;
    let snapshot = view.snapshot();

    let records = snapshot
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| record_dto(view.layout(), index, record))
        .collect();

    Json(RecordsResponse {
        cycle: snapshot.cycle,
        added: snapshot.added,
        taken_at: snapshot.taken_at,
        count: snapshot.len(),
        records,
    })
}

/// GET /api/v1/records/:id
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<RecordDto>> {
    let view = state.view.read().await;
    let snapshot = view.snapshot();

    snapshot
        .records
        .iter()
        .enumerate()
        .find(|(_, record)| record.id.as_str() == id)
        .map(|(index, record)| Json(record_dto(view.layout(), index, record)))
        .ok_or_else(|| ApiError::NotFound(format!("Record {} is not held", id)))
}

/// GET /api/v1/scene
pub async fn get_scene(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SceneParams>,
) -> ApiResult<Json<SceneResponse>> {
    let wanted = match params.state.as_deref() {
        None => None,
        Some("active") => Some(MarkState::Active),
        Some("exiting") => Some(MarkState::Exiting),
        Some(other) => {
            return Err(ApiError::Validation(format!(
                "Unknown mark state '{}', expected active or exiting",
                other
            )))
        }
    };

    let view = state.view.read().await;
    let layout = view.layout();
    let all = view.marks_at(Instant::now());

    let exiting = all.iter().filter(|m| m.state == MarkState::Exiting).count();
    let live = all.len() - exiting;
    let marks = match wanted {
        Some(wanted) => all.into_iter().filter(|m| m.state == wanted).collect(),
        None => all,
    };

    Ok(Json(SceneResponse {
        cycle: view.snapshot().cycle,
        width: layout.width,
        height: layout.height,
        baseline: layout.baseline,
        live,
        exiting,
        marks,
    }))
}

/// GET /api/v1/feed/status
pub async fn feed_status(State(state): State<Arc<AppState>>) -> Json<FeedStatus> {
    Json(state.feed_status.read().await.clone())
}

/// POST /api/v1/feed/refresh
///
/// Wakes the poller; the refresh itself runs under the overlap policy.
pub async fn trigger_refresh(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<RefreshResponse>)> {
    let status = state.feed_status.read().await;
    if !status.running {
        return Err(ApiError::ServiceUnavailable(
            "Poller is not running".to_string(),
        ));
    }

    state.refresh.notify_one();
    tracing::info!(cycle = status.cycle, "Manual refresh requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(RefreshResponse {
            status: "accepted".to_string(),
            cycle: status.cycle,
        }),
    ))
}
