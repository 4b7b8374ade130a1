//! Core constants for the Keygate access-control backend.
//!
//! These values define the PIN format accepted by the keypads, the factory
//! defaults written into every new device configuration and the field limits
//! enforced on registration.
//!
//! # Usage
//!
//! ```
//! use keygate_core::constants::*;
//!
//! assert_eq!(PIN_LENGTH, 4);
//! assert_eq!(DEFAULT_ADMIN_PIN.len(), PIN_LENGTH);
//! ```

// ============================================================================
// PIN Format
// ============================================================================

/// Number of digits in every PIN (user and admin).
///
/// The keypad firmware submits exactly this many ASCII digits. Anything else
/// is rejected before a device is even resolved.
pub const PIN_LENGTH: usize = 4;

// ============================================================================
// Factory Defaults
// ============================================================================

/// Factory admin override PIN.
///
/// Used when a device has no configuration row, and written into the default
/// configuration created alongside every new device. Deployments override it
/// through the `[access]` configuration section.
///
/// # Value: "8729"
pub const DEFAULT_ADMIN_PIN: &str = "8729";

/// Default door-open duration after a granted access (seconds).
///
/// # Value: 5 seconds
///
/// # Examples
///
/// ```
/// use keygate_core::constants::DEFAULT_DOOR_OPEN_DURATION_SECS;
/// use std::time::Duration;
///
/// let open_for = Duration::from_secs(u64::from(DEFAULT_DOOR_OPEN_DURATION_SECS));
/// assert_eq!(open_for.as_secs(), 5);
/// ```
pub const DEFAULT_DOOR_OPEN_DURATION_SECS: u32 = 5;

/// Default maximum login attempts stored in a new configuration.
///
/// The value is persisted and editable but no component enforces it.
///
/// # Value: 3
pub const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Upper bound accepted for the door-open duration (seconds).
///
/// # Value: 300 seconds (5 minutes)
pub const MAX_DOOR_OPEN_DURATION_SECS: u32 = 300;

// ============================================================================
// Registration Limits
// ============================================================================

/// Maximum device name length (characters).
pub const MAX_DEVICE_NAME_LENGTH: usize = 100;

/// Maximum username length (characters).
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Maximum first/last name length (characters).
pub const MAX_PERSON_NAME_LENGTH: usize = 150;

/// Maximum stored password length (characters).
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Audit Queries
// ============================================================================

/// Default number of access-log rows returned by a listing.
pub const DEFAULT_LOG_LIMIT: i64 = 100;

/// Maximum number of access-log rows returned by a single listing.
pub const MAX_LOG_LIMIT: i64 = 1000;
