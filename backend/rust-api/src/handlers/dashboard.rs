use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    handlers::ApiError,
    models::dashboard::DashboardQuery,
    services::{dashboard_service::DashboardService, AppState},
};

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let timeout_ms = query
        .timeout_ms
        .unwrap_or(state.config.dashboard_timeout_ms);

    let service = DashboardService::new(state.sessions.clone(), state.groups.clone());
    let snapshot = service
        .snapshot(Utc::now(), timeout_ms, query.group_id.as_deref())
        .await?;

    Ok(Json(snapshot))
}
