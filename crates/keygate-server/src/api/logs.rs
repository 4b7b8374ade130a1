use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use keygate_core::constants::DEFAULT_LOG_LIMIT;
use keygate_storage::AccessLogEntry;
use std::sync::Arc;

use super::{ApiError, ApiResponse, LogsQuery};
use crate::state::AppState;

/// `GET /api/logs?device_id=&limit=`, newest first.
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<AccessLogEntry>>>, ApiError> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);

    let logs = state.registration.list_logs(query.device_id, limit).await?;
    Ok(Json(ApiResponse::success(logs)))
}
