use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    errors::StoreError,
    handlers::ApiError,
    models::{
        session::{
            CompleteSessionRequest, CompleteSessionResponse, HeartbeatResponse,
            RecordAttemptRequest, SessionResponse,
        },
        CreateSessionRequest, NewAttempt,
    },
    services::{session_service::SessionService, AppState},
};

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| StoreError::validation(e.to_string()))?;

    let service = SessionService::new(state.sessions.clone(), state.groups.clone());
    let session = service
        .create_session(&req.name, req.group_id.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))))
}

/// Attempt ingestion is deliberately lenient: an unknown session gets
/// the same 201 as a recorded one, so a client racing a failed
/// creation never sees an error here.
pub async fn record_attempt(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<RecordAttemptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SessionService::new(state.sessions.clone(), state.groups.clone());
    service
        .record_attempt(
            &session_id,
            NewAttempt {
                module_id: req.module_id,
                question_id: req.question_id,
                selected_option_ids: req.selected_option_ids,
                is_correct: req.is_correct,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(json!({}))))
}

pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SessionService::new(state.sessions.clone(), state.groups.clone());
    let last_seen = service.heartbeat(&session_id).await?;
    Ok(Json(HeartbeatResponse { last_seen }))
}

pub async fn complete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<CompleteSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SessionService::new(state.sessions.clone(), state.groups.clone());
    let session = service
        .complete_session(&session_id, req.summary)
        .await?
        .ok_or_else(|| StoreError::not_found("session"))?;

    let end_time = session.end_time.unwrap_or(session.last_seen);
    Ok(Json(CompleteSessionResponse { end_time }))
}

pub async fn leave_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = SessionService::new(state.sessions.clone(), state.groups.clone());
    service.leave_session(&session_id).await?;
    Ok(Json(json!({})))
}
