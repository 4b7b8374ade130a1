use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use keygate_storage::User;
use std::sync::Arc;

use super::{ApiError, ApiResponse, CreateUserRequest, SetActiveRequest, UsersQuery};
use crate::state::AppState;

/// `GET /api/users?device_id=`; all users when no device is given.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UsersQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let Query(query) = query?;
    let users = state.registration.list_users(query.device_id).await?;
    Ok(Json(ApiResponse::success(users)))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let Json(request) = payload?;

    let user = state
        .registration
        .register_user(
            request.device_id,
            &request.username,
            &request.first_name,
            &request.last_name,
            &request.pin,
            &request.password,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn set_user_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let Json(request) = payload?;
    let user = state
        .registration
        .set_user_active(id, request.is_active)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.registration.delete_user(id).await?;
    Ok(Json(ApiResponse::success(())))
}
