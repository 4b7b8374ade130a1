use chrono::{DateTime, Utc};
use keygate_core::Pin;
use keygate_core::constants::{MAX_PASSWORD_LENGTH, MAX_PERSON_NAME_LENGTH, MAX_USERNAME_LENGTH};
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// A PIN holder scoped to one device.
///
/// # Fields
///
/// * `device_id` - Owning device; `None` only for users of the implicit
///   default device in single-tenant deployments
/// * `username` - Unique within the owning device, not globally
/// * `pin` - Exactly 4 ASCII digits; not unique
/// * `password` - Opaque, stored verbatim and never serialized
///
/// # Examples
///
/// ```
/// use keygate_storage::models::User;
/// use chrono::Utc;
///
/// let user = User {
///     id: 7,
///     device_id: Some(1),
///     username: "ana".to_string(),
///     first_name: "Ana".to_string(),
///     last_name: "Souza".to_string(),
///     pin: "4821".to_string(),
///     password: "secret".to_string(),
///     is_active: true,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
///
/// let json = serde_json::to_string(&user).unwrap();
/// assert!(!json.contains("secret"));
/// assert!(!json.contains("4821"));
/// ```
#[derive(Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub device_id: Option<i64>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,

    #[serde(skip_serializing, default)]
    pub pin: String,

    #[serde(skip_serializing, default)]
    pub password: String,

    /// Inactive users never match a PIN
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Credentials stay out of logs
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("device_id", &self.device_id)
            .field("username", &self.username)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

/// Validated input for registering a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub device_id: Option<i64>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub pin: Pin,
    pub password: String,
}

impl NewUser {
    /// Validate registration input.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` when the PIN is not exactly 4 digits,
    /// the username is blank, or a field exceeds its maximum length.
    pub fn new(
        device_id: Option<i64>,
        username: &str,
        first_name: &str,
        last_name: &str,
        pin: &str,
        password: &str,
    ) -> StorageResult<Self> {
        let pin = Pin::new(pin)?;

        let username = username.trim();
        if username.is_empty() {
            return Err(StorageError::Validation("username is required".to_string()));
        }
        check_length("username", username, MAX_USERNAME_LENGTH)?;
        check_length("first_name", first_name.trim(), MAX_PERSON_NAME_LENGTH)?;
        check_length("last_name", last_name.trim(), MAX_PERSON_NAME_LENGTH)?;
        check_length("password", password, MAX_PASSWORD_LENGTH)?;

        Ok(Self {
            device_id,
            username: username.to_string(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            pin,
            password: password.to_string(),
        })
    }
}

fn check_length(field: &str, value: &str, max: usize) -> StorageResult<()> {
    if value.chars().count() > max {
        return Err(StorageError::Validation(format!(
            "{field} exceeds {max} characters"
        )));
    }
    Ok(())
}
