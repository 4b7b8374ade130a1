//! Device-facing verification endpoint.
//!
//! Responses always use the flat [`VerifyResponse`] shape, errors included,
//! so keypad firmware only has to parse one body.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use keygate_storage::{AccessError, DisplayMessages, VerificationRequest};
use std::sync::Arc;

use super::origin::OriginAddress;
use super::{VerifyRequest, VerifyResponse};
use crate::state::AppState;

/// `POST /api/access/verify`: 200 on a grant, 401 on a denial.
pub async fn verify_access(
    State(state): State<Arc<AppState>>,
    OriginAddress(origin): OriginAddress,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(%origin, "Rejected verification body: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(VerifyResponse::rejected(DisplayMessages::PIN_MISSING)),
            )
                .into_response();
        }
    };

    let request = VerificationRequest {
        pin: body.pin,
        origin,
        device_id: body.device_id,
    };

    match state.access.verify_access(&request).await {
        Ok(outcome) => {
            let status = if outcome.granted() {
                StatusCode::OK
            } else {
                StatusCode::UNAUTHORIZED
            };
            (status, Json(VerifyResponse::from_outcome(&outcome))).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: AccessError) -> Response {
    let (status, message) = match err {
        AccessError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        AccessError::DeviceNotFound(_) => (
            StatusCode::NOT_FOUND,
            DisplayMessages::DEVICE_NOT_FOUND.to_string(),
        ),
        AccessError::Persistence(e) => {
            tracing::error!("Access verification failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                DisplayMessages::INTERNAL_ERROR.to_string(),
            )
        }
    };

    (status, Json(VerifyResponse::rejected(message))).into_response()
}
