use chrono::{DateTime, Utc};
use keygate_core::constants::MAX_DEVICE_NAME_LENGTH;
use keygate_core::canonical_address;
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// A physical access-control device (door controller, keypad) identified by
/// its network address.
///
/// # Database Schema
///
/// Maps to the `devices` table:
/// - `name` and `address` are each globally unique
/// - `address` is always stored in canonical form (see [`canonical_address`])
/// - deleting a device cascades to its users, configuration and access logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    pub id: i64,

    /// Human-readable unique name (1-100 characters)
    pub name: String,

    /// Canonical IP address the device sends requests from
    pub address: String,

    pub description: Option<String>,

    /// Inactive devices are never resolved for verification
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for registering a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDevice {
    pub name: String,
    pub address: String,
    pub description: Option<String>,
}

impl NewDevice {
    /// Validate and normalize registration input.
    ///
    /// The name is trimmed, the address canonicalized and a blank
    /// description dropped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Validation` for an empty or oversized name or an
    /// address that is not an IP address.
    ///
    /// # Examples
    ///
    /// ```
    /// use keygate_storage::models::NewDevice;
    ///
    /// let device = NewDevice::new(" Front Door ", "::ffff:10.0.0.5", Some("  ")).unwrap();
    /// assert_eq!(device.name, "Front Door");
    /// assert_eq!(device.address, "10.0.0.5");
    /// assert_eq!(device.description, None);
    /// ```
    pub fn new(name: &str, address: &str, description: Option<&str>) -> StorageResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::Validation(
                "device name is required".to_string(),
            ));
        }
        if name.chars().count() > MAX_DEVICE_NAME_LENGTH {
            return Err(StorageError::Validation(format!(
                "device name exceeds {MAX_DEVICE_NAME_LENGTH} characters"
            )));
        }

        let address = canonical_address(address)?;
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            address,
            description,
        })
    }
}
