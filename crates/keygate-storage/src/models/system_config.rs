use chrono::{DateTime, Utc};
use keygate_core::constants::MAX_DOOR_OPEN_DURATION_SECS;
use keygate_core::{AccessDefaults, Pin};
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Per-device access configuration.
///
/// `device_id = None` is the global configuration used by the implicit
/// default device of single-tenant deployments. At most one row exists per
/// device and at most one global row.
#[derive(Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SystemConfig {
    pub id: i64,
    pub device_id: Option<i64>,
    pub admin_pin: String,

    /// Seconds the door stays open after a grant
    pub door_open_duration: i64,

    /// Stored and editable, not enforced
    pub max_login_attempts: i64,

    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for SystemConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemConfig")
            .field("id", &self.id)
            .field("device_id", &self.device_id)
            .field("admin_pin", &"****")
            .field("door_open_duration", &self.door_open_duration)
            .field("max_login_attempts", &self.max_login_attempts)
            .finish()
    }
}

/// Partial update of a [`SystemConfig`]; `None` fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigUpdate {
    pub admin_pin: Option<String>,
    pub door_open_duration: Option<i64>,
    pub max_login_attempts: Option<i64>,
}

/// Fully resolved configuration values ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValues {
    pub admin_pin: Pin,
    pub door_open_duration: i64,
    pub max_login_attempts: i64,
}

impl ConfigValues {
    pub fn from_defaults(defaults: &AccessDefaults) -> Self {
        Self {
            admin_pin: defaults.admin_pin.clone(),
            door_open_duration: i64::from(defaults.door_open_duration),
            max_login_attempts: i64::from(defaults.max_login_attempts),
        }
    }

    /// Start from the stored row, or the defaults when none exists.
    pub fn base(
        existing: Option<&SystemConfig>,
        defaults: &AccessDefaults,
    ) -> StorageResult<Self> {
        match existing {
            Some(config) => Ok(Self {
                admin_pin: Pin::new(&config.admin_pin)?,
                door_open_duration: config.door_open_duration,
                max_login_attempts: config.max_login_attempts,
            }),
            None => Ok(Self::from_defaults(defaults)),
        }
    }

    pub fn apply(mut self, update: &ConfigUpdate) -> StorageResult<Self> {
        if let Some(pin) = &update.admin_pin {
            self.admin_pin = Pin::new(pin)?;
        }
        if let Some(duration) = update.door_open_duration {
            if !(1..=i64::from(MAX_DOOR_OPEN_DURATION_SECS)).contains(&duration) {
                return Err(StorageError::Validation(format!(
                    "door_open_duration must be between 1 and {MAX_DOOR_OPEN_DURATION_SECS} seconds"
                )));
            }
            self.door_open_duration = duration;
        }
        if let Some(attempts) = update.max_login_attempts {
            if attempts < 1 {
                return Err(StorageError::Validation(
                    "max_login_attempts must be at least 1".to_string(),
                ));
            }
            self.max_login_attempts = attempts;
        }
        Ok(self)
    }
}
