use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use keygate_storage::{ConfigUpdate, EffectiveConfig, SystemConfig};
use std::sync::Arc;

use super::{ApiError, ApiResponse, StatusResponse};
use crate::state::AppState;

/// Liveness plus a database round-trip. Answers 503 when the database is
/// unreachable.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<StatusResponse>>) {
    let (code, database) = match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, "ok".to_string()),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable".to_string())
        }
    };

    let status = StatusResponse {
        status: if code.is_success() { "running" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        tenancy: state.access.tenancy(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    };

    (code, Json(ApiResponse::success(status)))
}

/// Global configuration, used by the implicit device of single-tenant
/// deployments.
pub async fn get_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<EffectiveConfig>>, ApiError> {
    let config = state.registration.config(None).await?;
    Ok(Json(ApiResponse::success(config)))
}

/// Edit the global configuration. Only single-tenant deployments read it;
/// multi-tenant ones answer 409 and point at the per-device endpoint.
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConfigUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<SystemConfig>>, ApiError> {
    if !state.access.tenancy().is_single_tenant() {
        return Err(ApiError::Conflict(
            "the global configuration is unused in multi-tenant mode; \
             update /api/devices/{id}/config instead"
                .to_string(),
        ));
    }

    let Json(update) = payload?;
    let config = state.registration.update_config(None, &update).await?;
    Ok(Json(ApiResponse::success(config)))
}
