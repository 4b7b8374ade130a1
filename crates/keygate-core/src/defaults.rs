//! Deployment-wide access defaults.
//!
//! The factory admin PIN and door timing are not scattered literals: they are
//! carried by [`AccessDefaults`], built once at boot (usually from the
//! `[access]` section of the server configuration) and handed to the decision
//! engine and the registration service.

use crate::constants::{
    DEFAULT_ADMIN_PIN, DEFAULT_DOOR_OPEN_DURATION_SECS, DEFAULT_MAX_LOGIN_ATTEMPTS,
    MAX_DOOR_OPEN_DURATION_SECS,
};
use crate::{Error, Pin, Result};
use serde::{Deserialize, Serialize};

/// Values used when a device has no configuration row, and written into the
/// configuration created alongside every new device.
///
/// # Examples
///
/// ```
/// use keygate_core::{AccessDefaults, Pin};
///
/// let defaults = AccessDefaults::default();
/// assert_eq!(defaults.admin_pin, Pin::new("8729").unwrap());
/// assert_eq!(defaults.door_open_duration, 5);
///
/// let custom = AccessDefaults::default().with_admin_pin(Pin::new("1357").unwrap());
/// assert!(custom.admin_pin.matches("1357"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessDefaults {
    /// Fallback admin override PIN
    #[serde(rename = "default_admin_pin")]
    pub admin_pin: Pin,

    /// Door-open duration in seconds
    pub door_open_duration: u32,

    /// Stored in new configurations; not enforced
    pub max_login_attempts: u32,
}

impl Default for AccessDefaults {
    fn default() -> Self {
        Self {
            admin_pin: Pin(DEFAULT_ADMIN_PIN.to_string()),
            door_open_duration: DEFAULT_DOOR_OPEN_DURATION_SECS,
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
        }
    }
}

impl AccessDefaults {
    /// Replace the fallback admin PIN
    #[must_use]
    pub fn with_admin_pin(mut self, pin: Pin) -> Self {
        self.admin_pin = pin;
        self
    }

    /// Replace the default door-open duration
    #[must_use]
    pub fn with_door_open_duration(mut self, seconds: u32) -> Self {
        self.door_open_duration = seconds;
        self
    }

    /// Check the numeric bounds.
    ///
    /// # Errors
    /// Returns `Error::Config` if the duration is outside `1..=300` or the
    /// attempt count is zero.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_DOOR_OPEN_DURATION_SECS).contains(&self.door_open_duration) {
            return Err(Error::Config(format!(
                "door_open_duration must be 1-{MAX_DOOR_OPEN_DURATION_SECS} seconds, got {}",
                self.door_open_duration
            )));
        }

        if self.max_login_attempts == 0 {
            return Err(Error::Config(
                "max_login_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = AccessDefaults::default();
        assert!(defaults.admin_pin.matches(DEFAULT_ADMIN_PIN));
        assert_eq!(defaults.door_open_duration, 5);
        assert_eq!(defaults.max_login_attempts, 3);
        assert!(defaults.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let defaults = AccessDefaults::default().with_door_open_duration(0);
        assert!(matches!(defaults.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let defaults = AccessDefaults {
            max_login_attempts: 0,
            ..AccessDefaults::default()
        };
        assert!(defaults.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_section() {
        let defaults: AccessDefaults =
            serde_json::from_str(r#"{ "default_admin_pin": "1357" }"#).unwrap();
        assert!(defaults.admin_pin.matches("1357"));
        assert_eq!(defaults.door_open_duration, 5);

        let bad = serde_json::from_str::<AccessDefaults>(r#"{ "default_admin_pin": "13" }"#);
        assert!(bad.is_err());
    }
}
