//! Administrative paths: device and user registration, configuration and
//! listings.
//!
//! Uniqueness is checked up front so callers get a [`StorageError::Duplicate`]
//! naming the field; the database indexes still back the check when two
//! registrations race.

use crate::error::{StorageError, StorageResult};
use crate::models::{
    AccessLogEntry, ConfigUpdate, ConfigValues, Device, NewDevice, NewUser, SystemConfig, User,
};
use crate::repositories::{
    AccessLogRepository, DeviceRepository, SqliteAccessLogRepository, SqliteDeviceRepository,
    SqliteSystemConfigRepository, SqliteUserRepository, SystemConfigRepository, UserRepository,
};
use crate::transaction;
use keygate_core::constants::MAX_LOG_LIMIT;
use keygate_core::{AccessDefaults, TenancyMode, canonical_address};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

/// Configuration of a scope as the engine will apply it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    pub device_id: Option<i64>,
    pub admin_pin: String,
    pub door_open_duration: i64,
    pub max_login_attempts: i64,
    /// `false` when no row exists and the injected defaults apply
    pub stored: bool,
}

#[derive(Debug, Clone)]
pub struct RegistrationService {
    pool: SqlitePool,
    devices: SqliteDeviceRepository,
    users: SqliteUserRepository,
    configs: SqliteSystemConfigRepository,
    logs: SqliteAccessLogRepository,
    defaults: AccessDefaults,
    tenancy: TenancyMode,
}

impl RegistrationService {
    pub fn new(pool: SqlitePool, defaults: AccessDefaults, tenancy: TenancyMode) -> Self {
        Self {
            devices: SqliteDeviceRepository::new(pool.clone()),
            users: SqliteUserRepository::new(pool.clone()),
            configs: SqliteSystemConfigRepository::new(pool.clone()),
            logs: SqliteAccessLogRepository::new(pool.clone()),
            pool,
            defaults,
            tenancy,
        }
    }

    /// Register a device together with its default configuration.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank or oversized name or a non-IP address
    /// - `Duplicate` naming `name` or `address` when already registered
    pub async fn register_device(
        &self,
        name: &str,
        address: &str,
        description: Option<&str>,
    ) -> StorageResult<Device> {
        let new_device = NewDevice::new(name, address, description)?;

        if self.devices.find_by_name(&new_device.name).await?.is_some() {
            return Err(StorageError::duplicate("Device", "name", &new_device.name));
        }
        if self
            .devices
            .find_by_address(&new_device.address)
            .await?
            .is_some()
        {
            return Err(StorageError::duplicate("Device", "address", &new_device.address));
        }

        let config = ConfigValues::from_defaults(&self.defaults);
        let mut tx = self.pool.begin().await?;
        let device = transaction::create_device_with_config(&mut tx, &new_device, &config)
            .await
            .map_err(|e| device_conflict(e, &new_device.name, &new_device.address))?;
        tx.commit().await?;

        info!(device_id = device.id, name = %device.name, address = %device.address, "Device registered");
        Ok(device)
    }

    /// Register a PIN holder.
    ///
    /// Multi-tenant deployments require an existing `device_id`; single-tenant
    /// deployments also accept deviceless users.
    pub async fn register_user(
        &self,
        device_id: Option<i64>,
        username: &str,
        first_name: &str,
        last_name: &str,
        pin: &str,
        password: &str,
    ) -> StorageResult<User> {
        let new_user = NewUser::new(device_id, username, first_name, last_name, pin, password)?;

        match new_user.device_id {
            Some(id) => {
                self.require_device(id).await?;
            }
            None if !self.tenancy.is_single_tenant() => {
                return Err(StorageError::Validation(
                    "device_id is required".to_string(),
                ));
            }
            None => {}
        }

        if self
            .users
            .find_by_device_and_username(new_user.device_id, &new_user.username)
            .await?
            .is_some()
        {
            return Err(StorageError::duplicate("User", "username", &new_user.username));
        }

        let user = self.users.create(&new_user).await.map_err(|e| {
            if e.is_unique_violation() {
                StorageError::duplicate("User", "username", &new_user.username)
            } else {
                e
            }
        })?;

        info!(user_id = user.id, device_id = ?user.device_id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Move a device to a new address.
    pub async fn update_device_address(&self, id: i64, address: &str) -> StorageResult<Device> {
        let address = canonical_address(address)?;
        self.require_device(id).await?;

        if let Some(other) = self.devices.find_by_address(&address).await?
            && other.id != id
        {
            return Err(StorageError::duplicate("Device", "address", &address));
        }

        let device = self
            .devices
            .update_address(id, &address)
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    StorageError::duplicate("Device", "address", &address)
                } else {
                    e
                }
            })?;

        info!(device_id = id, address = %device.address, "Device address updated");
        Ok(device)
    }

    pub async fn set_device_active(&self, id: i64, active: bool) -> StorageResult<Device> {
        let device = self.devices.set_active(id, active).await?;
        info!(device_id = id, active, "Device active flag changed");
        Ok(device)
    }

    pub async fn set_user_active(&self, id: i64, active: bool) -> StorageResult<User> {
        let user = self.users.set_active(id, active).await?;
        info!(user_id = id, active, "User active flag changed");
        Ok(user)
    }

    /// Configuration of a device (`None` is the global configuration).
    pub async fn config(&self, device_id: Option<i64>) -> StorageResult<EffectiveConfig> {
        if let Some(id) = device_id {
            self.require_device(id).await?;
        }

        let stored = self.configs.find_for_device(device_id).await?;
        let values = ConfigValues::base(stored.as_ref(), &self.defaults)?;
        Ok(EffectiveConfig {
            device_id,
            admin_pin: values.admin_pin.as_str().to_string(),
            door_open_duration: values.door_open_duration,
            max_login_attempts: values.max_login_attempts,
            stored: stored.is_some(),
        })
    }

    /// Validate a partial update and upsert the configuration row.
    pub async fn update_config(
        &self,
        device_id: Option<i64>,
        update: &ConfigUpdate,
    ) -> StorageResult<SystemConfig> {
        if let Some(id) = device_id {
            self.require_device(id).await?;
        }

        let existing = self.configs.find_for_device(device_id).await?;
        let values = ConfigValues::base(existing.as_ref(), &self.defaults)?.apply(update)?;
        let config = self.configs.upsert(device_id, &values).await?;

        info!(
            device_id = ?device_id,
            door_open_duration = config.door_open_duration,
            admin_pin_changed = update.admin_pin.is_some(),
            "Configuration updated"
        );
        Ok(config)
    }

    /// Delete a device with its users, configuration and access logs.
    pub async fn delete_device(&self, id: i64) -> StorageResult<()> {
        self.devices.delete(id).await?;
        info!(device_id = id, "Device deleted");
        Ok(())
    }

    /// Delete a user. Its access logs remain with the user reference cleared.
    pub async fn delete_user(&self, id: i64) -> StorageResult<()> {
        self.users.delete(id).await?;
        info!(user_id = id, "User deleted");
        Ok(())
    }

    pub async fn list_devices(&self) -> StorageResult<Vec<Device>> {
        self.devices.list_all().await
    }

    /// Users of one device, or every user when `device_id` is `None`.
    pub async fn list_users(&self, device_id: Option<i64>) -> StorageResult<Vec<User>> {
        match device_id {
            Some(id) => {
                self.require_device(id).await?;
                self.users.list_by_device(Some(id)).await
            }
            None => self.users.list_all().await,
        }
    }

    /// Newest access logs, optionally for one device.
    ///
    /// # Errors
    ///
    /// `Validation` when `limit` is outside `1..=1000`.
    pub async fn list_logs(
        &self,
        device_id: Option<i64>,
        limit: i64,
    ) -> StorageResult<Vec<AccessLogEntry>> {
        if !(1..=MAX_LOG_LIMIT).contains(&limit) {
            return Err(StorageError::Validation(format!(
                "limit must be between 1 and {MAX_LOG_LIMIT}"
            )));
        }
        if let Some(id) = device_id {
            self.require_device(id).await?;
        }
        self.logs.find_recent(device_id, limit).await
    }

    async fn require_device(&self, id: i64) -> StorageResult<Device> {
        self.devices
            .find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::not_found("Device", "id", id))
    }
}

/// Map a unique violation raced past the pre-checks onto the field it hit.
fn device_conflict(err: StorageError, name: &str, address: &str) -> StorageError {
    if !err.is_unique_violation() {
        return err;
    }
    if err.to_string().contains("devices.address") {
        StorageError::duplicate("Device", "address", address)
    } else {
        StorageError::duplicate("Device", "name", name)
    }
}
