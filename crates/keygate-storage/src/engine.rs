//! Access Decision Engine.
//!
//! Given a resolved [`DeviceScope`] and a submitted PIN, the engine applies a
//! strict precedence, first match wins:
//!
//! 1. **Input**: the PIN must be present and exactly 4 ASCII digits, otherwise
//!    `AccessError::InvalidInput`
//! 2. **Admin PIN**: the scope's configured admin PIN, or the injected default
//!    when the scope has no configuration row → granted, `admin`
//! 3. **User PIN**: an active user of the same device holding the PIN →
//!    granted, `user` (lowest id wins when several match)
//! 4. **Deny**: `no_match`
//!
//! The engine reads only. Recording the decision is the job of
//! [`AuditLogger`](crate::audit::AuditLogger).

use crate::error::{AccessError, AccessResult};
use crate::messages::DisplayMessages;
use crate::models::{SystemConfig, User};
use crate::registry::DeviceScope;
use crate::store::AccessStore;
use keygate_core::{AccessDefaults, AccessReason, Pin};
use tracing::{debug, warn};

/// Outcome of a completed decision.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub granted: bool,
    /// Set only for `AccessReason::User`
    pub matched_user: Option<User>,
    pub reason: AccessReason,
    /// How long the door should stay open; `None` on denial
    pub door_open_seconds: Option<u32>,
}

impl Verdict {
    fn admin(door_open_seconds: u32) -> Self {
        Self {
            granted: true,
            matched_user: None,
            reason: AccessReason::Admin,
            door_open_seconds: Some(door_open_seconds),
        }
    }

    fn user(user: User, door_open_seconds: u32) -> Self {
        Self {
            granted: true,
            matched_user: Some(user),
            reason: AccessReason::User,
            door_open_seconds: Some(door_open_seconds),
        }
    }

    fn deny() -> Self {
        Self {
            granted: false,
            matched_user: None,
            reason: AccessReason::NoMatch,
            door_open_seconds: None,
        }
    }

    /// Message shown on the device.
    pub fn message(&self) -> String {
        DisplayMessages::for_reason(
            self.reason,
            self.matched_user.as_ref().map(|u| u.username.as_str()),
        )
    }
}

/// Check that a PIN was submitted and has the right shape.
///
/// # Errors
///
/// `AccessError::InvalidInput` for a missing, empty or malformed PIN.
///
/// # Examples
///
/// ```
/// use keygate_storage::engine::validate_pin;
///
/// assert!(validate_pin(Some("4821")).is_ok());
/// assert!(validate_pin(Some("48")).is_err());
/// assert!(validate_pin(None).is_err());
/// ```
pub fn validate_pin(submitted: Option<&str>) -> AccessResult<Pin> {
    match submitted {
        None | Some("") => Err(AccessError::InvalidInput(
            DisplayMessages::PIN_MISSING.to_string(),
        )),
        Some(raw) => Pin::new(raw)
            .map_err(|_| AccessError::InvalidInput(DisplayMessages::PIN_MALFORMED.to_string())),
    }
}

/// Computes verdicts from device configuration and the user table.
#[derive(Debug, Clone)]
pub struct AccessDecisionEngine<S> {
    store: S,
    defaults: AccessDefaults,
}

impl<S: AccessStore> AccessDecisionEngine<S> {
    pub fn new(store: S, defaults: AccessDefaults) -> Self {
        Self { store, defaults }
    }

    pub fn defaults(&self) -> &AccessDefaults {
        &self.defaults
    }

    /// Validate the raw PIN, then decide.
    pub async fn verify(&self, scope: &DeviceScope, submitted: Option<&str>) -> AccessResult<Verdict> {
        let pin = validate_pin(submitted)?;
        self.decide(scope, &pin).await
    }

    /// Apply admin → user → deny precedence to an already validated PIN.
    ///
    /// # Errors
    ///
    /// Only `AccessError::Persistence`: a failed read never becomes a denial.
    pub async fn decide(&self, scope: &DeviceScope, pin: &Pin) -> AccessResult<Verdict> {
        let device_id = scope.device_id();
        let config = self.store.find_config_for_device(device_id).await?;
        let door_open_seconds = self.door_open_seconds(config.as_ref());

        let is_admin = match &config {
            Some(config) => pin.matches(&config.admin_pin),
            None => *pin == self.defaults.admin_pin,
        };
        if is_admin {
            debug!(?device_id, "Admin PIN matched");
            return Ok(Verdict::admin(door_open_seconds));
        }

        let candidates: Vec<User> = self
            .store
            .find_users_by_device_and_pin(device_id, pin)
            .await?
            .into_iter()
            .filter(|u| u.is_active && u.device_id == device_id && pin.matches(&u.pin))
            .collect();

        if candidates.len() > 1 {
            warn!(
                ?device_id,
                candidates = candidates.len(),
                "PIN shared by several active users; granting as the lowest user id"
            );
        }

        match candidates.into_iter().min_by_key(|u| u.id) {
            Some(user) => {
                debug!(?device_id, user_id = user.id, "User PIN matched");
                Ok(Verdict::user(user, door_open_seconds))
            }
            None => Ok(Verdict::deny()),
        }
    }

    fn door_open_seconds(&self, config: Option<&SystemConfig>) -> u32 {
        config
            .and_then(|c| u32::try_from(c.door_open_duration).ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(self.defaults.door_open_duration)
    }
}
