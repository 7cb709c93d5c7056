use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    handlers::ApiError,
    services::{content_service::ContentService, group_service::GroupService, AppState},
};

/// Full quiz configuration as one payload; the client never paginates.
pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ContentService::new(state.content.clone(), state.content_cache.clone());
    let config = service.get_quiz_config().await?;
    Ok(Json((*config).clone()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAccessQuery {
    #[serde(default)]
    pub pass_key: String,
}

pub async fn group_access(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GroupAccessQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = GroupService::new(state.groups.clone());
    let access = service.access_by_pass_key(&query.pass_key).await?;
    Ok(Json(access))
}
