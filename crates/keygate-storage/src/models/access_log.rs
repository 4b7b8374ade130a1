use chrono::{DateTime, Utc};
use keygate_core::AccessReason;
use serde::{Deserialize, Serialize};

/// Append-only record of one access decision.
///
/// One row is written for every completed decision (admin grant, user grant
/// or denial). Requests rejected before a decision (malformed PIN, unknown
/// device) leave no row.
///
/// # Fields
///
/// * `device_id` - Device the decision ran against; `None` for the implicit
///   default device
/// * `user_id` - Matched user; `None` for denials and admin grants, and
///   cleared when the user is later deleted
/// * `access_time` - Set once at creation
/// * `reason` - `admin`, `user` or `no_match`; use [`AccessLog::get_reason`]
/// * `ip_address` - Origin address of the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessLog {
    pub id: i64,
    pub device_id: Option<i64>,
    pub user_id: Option<i64>,
    pub access_time: DateTime<Utc>,
    pub success: bool,
    pub reason: String,
    pub ip_address: Option<String>,
}

impl AccessLog {
    /// Parse the stored reason; `None` only for rows written outside Keygate.
    pub fn get_reason(&self) -> Option<AccessReason> {
        self.reason.parse().ok()
    }
}

/// Values for a new access-log row. `access_time` is stamped on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessLog {
    pub device_id: Option<i64>,
    pub user_id: Option<i64>,
    pub success: bool,
    pub reason: AccessReason,
    pub ip_address: Option<String>,
}

impl NewAccessLog {
    /// # Examples
    ///
    /// ```
    /// use keygate_core::AccessReason;
    /// use keygate_storage::models::NewAccessLog;
    ///
    /// let entry = NewAccessLog::new(Some(1), None, AccessReason::NoMatch, Some("10.0.0.5".into()));
    /// assert!(!entry.success);
    /// ```
    pub fn new(
        device_id: Option<i64>,
        user_id: Option<i64>,
        reason: AccessReason,
        ip_address: Option<String>,
    ) -> Self {
        Self {
            device_id,
            user_id,
            success: reason.is_grant(),
            reason,
            ip_address,
        }
    }
}

/// Access log joined with the names of its device and user, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessLogEntry {
    pub id: i64,
    pub device_id: Option<i64>,
    pub device_name: Option<String>,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub access_time: DateTime<Utc>,
    pub success: bool,
    pub reason: String,
    pub ip_address: Option<String>,
}
