#![allow(async_fn_in_trait)]

//! Persistence interface consumed by the verification flow.
//!
//! The registry, decision engine and audit logger only see [`AccessStore`],
//! so their behaviour can be tested against a store that fails on demand.

use crate::error::StorageResult;
use crate::models::{AccessLog, Device, NewAccessLog, SystemConfig, User};
use crate::repositories::{
    AccessLogRepository, DeviceRepository, SqliteAccessLogRepository, SqliteDeviceRepository,
    SqliteSystemConfigRepository, SqliteUserRepository, SystemConfigRepository, UserRepository,
};
use keygate_core::Pin;
use sqlx::SqlitePool;

/// Reads and the single write the verify path needs.
///
/// `device_id = None` always means the implicit default device of a
/// single-tenant deployment.
pub trait AccessStore: Send + Sync {
    /// Active device registered at a canonical address
    async fn find_active_device_by_address(&self, address: &str) -> StorageResult<Option<Device>>;

    async fn find_active_device_by_id(&self, id: i64) -> StorageResult<Option<Device>>;

    async fn find_config_for_device(
        &self,
        device_id: Option<i64>,
    ) -> StorageResult<Option<SystemConfig>>;

    /// Active users of the device holding `pin`, ordered by id
    async fn find_users_by_device_and_pin(
        &self,
        device_id: Option<i64>,
        pin: &Pin,
    ) -> StorageResult<Vec<User>>;

    async fn insert_access_log(&self, log: &NewAccessLog) -> StorageResult<AccessLog>;
}

/// [`AccessStore`] backed by the SQLite repositories.
#[derive(Debug, Clone)]
pub struct SqliteAccessStore {
    devices: SqliteDeviceRepository,
    users: SqliteUserRepository,
    configs: SqliteSystemConfigRepository,
    logs: SqliteAccessLogRepository,
}

impl SqliteAccessStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            devices: SqliteDeviceRepository::new(pool.clone()),
            users: SqliteUserRepository::new(pool.clone()),
            configs: SqliteSystemConfigRepository::new(pool.clone()),
            logs: SqliteAccessLogRepository::new(pool),
        }
    }
}

impl AccessStore for SqliteAccessStore {
    async fn find_active_device_by_address(&self, address: &str) -> StorageResult<Option<Device>> {
        self.devices.find_active_by_address(address).await
    }

    async fn find_active_device_by_id(&self, id: i64) -> StorageResult<Option<Device>> {
        self.devices.find_active_by_id(id).await
    }

    async fn find_config_for_device(
        &self,
        device_id: Option<i64>,
    ) -> StorageResult<Option<SystemConfig>> {
        self.configs.find_for_device(device_id).await
    }

    async fn find_users_by_device_and_pin(
        &self,
        device_id: Option<i64>,
        pin: &Pin,
    ) -> StorageResult<Vec<User>> {
        self.users.find_active_by_device_and_pin(device_id, pin).await
    }

    async fn insert_access_log(&self, log: &NewAccessLog) -> StorageResult<AccessLog> {
        self.logs.create(log).await
    }
}
