use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub code: String,
    pub device_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdResponse {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionRequest {
    pub code: String,
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub active: bool,
    pub participant_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub session_id: String,
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub ok: bool,
    pub ended: bool,
}

/// POST /api/session/create
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<SessionIdResponse>, AppError> {
    let session_id = state.store.create_session(&req.code, &req.device_id).await?;

    Ok(Json(SessionIdResponse { session_id }))
}

/// POST /api/session/join
pub async fn join_session(
    State(state): State<AppState>,
    Json(req): Json<JoinSessionRequest>,
) -> Result<Json<SessionIdResponse>, AppError> {
    let session_id = state.store.join_session(&req.code, &req.device_id).await?;

    Ok(Json(SessionIdResponse { session_id }))
}

/// POST /api/session/end
pub async fn end_session(
    State(state): State<AppState>,
    Json(req): Json<EndSessionRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.end_session(&req.session_id).await?;

    Ok(Json(serde_json::json!({"ok": true})))
}

/// GET /api/session/:session_id/status
///
/// Never fails; unknown sessions report inactive and empty.
pub async fn session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<StatusResponse> {
    let status = state.store.status(&session_id).await;

    Json(StatusResponse {
        active: status.active,
        participant_count: status.participant_count,
    })
}

/// POST /api/session/heartbeat
pub async fn heartbeat(
    State(state): State<AppState>,
    Json(req): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, AppError> {
    let outcome = state
        .store
        .heartbeat(&req.session_id, &req.device_id)
        .await?;

    Ok(Json(HeartbeatResponse {
        ok: true,
        ended: outcome.ended,
    }))
}
