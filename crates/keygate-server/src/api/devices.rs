use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use keygate_storage::{ConfigUpdate, Device, EffectiveConfig, SystemConfig};
use std::sync::Arc;

use super::{
    ApiError, ApiResponse, CreateDeviceRequest, SetActiveRequest, UpdateAddressRequest,
};
use crate::state::AppState;

pub async fn list_devices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Device>>>, ApiError> {
    let devices = state.registration.list_devices().await?;
    Ok(Json(ApiResponse::success(devices)))
}

pub async fn create_device(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateDeviceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Device>>), ApiError> {
    let Json(request) = payload?;

    let device = state
        .registration
        .register_device(
            &request.name,
            &request.address,
            request.description.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(device))))
}

pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.registration.delete_device(id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub async fn update_device_address(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateAddressRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Device>>, ApiError> {
    let Json(request) = payload?;
    let device = state
        .registration
        .update_device_address(id, &request.address)
        .await?;
    Ok(Json(ApiResponse::success(device)))
}

pub async fn set_device_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Device>>, ApiError> {
    let Json(request) = payload?;
    let device = state
        .registration
        .set_device_active(id, request.is_active)
        .await?;
    Ok(Json(ApiResponse::success(device)))
}

pub async fn get_device_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<EffectiveConfig>>, ApiError> {
    let config = state.registration.config(Some(id)).await?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn update_device_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<ConfigUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<SystemConfig>>, ApiError> {
    let Json(update) = payload?;
    let config = state.registration.update_config(Some(id), &update).await?;
    Ok(Json(ApiResponse::success(config)))
}
