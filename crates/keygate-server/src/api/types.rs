use keygate_core::TenancyMode;
use keygate_storage::VerificationOutcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Body sent by a keypad.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default)]
    pub device_id: Option<i64>,
}

/// Device-facing verification result. Not wrapped in [`ApiResponse`]: the
/// keypad firmware reads these fields at the top level.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub access_granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub door_open_seconds: Option<u32>,
}

impl VerifyResponse {
    pub fn from_outcome(outcome: &VerificationOutcome) -> Self {
        Self {
            success: true,
            access_granted: outcome.granted(),
            reason: Some(outcome.verdict.reason.to_string()),
            message: outcome.message(),
            user_name: outcome
                .verdict
                .matched_user
                .as_ref()
                .map(|u| u.username.clone()),
            device_name: outcome.scope.name().map(str::to_string),
            door_open_seconds: outcome.verdict.door_open_seconds,
        }
    }

    /// Request rejected before a decision was made.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            access_granted: false,
            reason: None,
            message: message.into(),
            user_name: None,
            device_name: None,
            door_open_seconds: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateDeviceRequest {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAddressRequest {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub device_id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub pin: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub device_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub device_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub tenancy: TenancyMode,
    pub uptime_secs: u64,
}
