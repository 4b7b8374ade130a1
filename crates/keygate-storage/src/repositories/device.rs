#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::Device;
use chrono::Utc;
use sqlx::SqlitePool;

/// Repository trait for Device entity operations
///
/// Addresses passed in must already be canonical (see
/// [`keygate_core::canonical_address`]); lookups compare the stored text.
pub trait DeviceRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Device>>;

    async fn find_by_name(&self, name: &str) -> StorageResult<Option<Device>>;

    /// Find a device by address regardless of its active flag
    async fn find_by_address(&self, address: &str) -> StorageResult<Option<Device>>;

    /// Find the active device registered at `address`
    async fn find_active_by_address(&self, address: &str) -> StorageResult<Option<Device>>;

    async fn find_active_by_id(&self, id: i64) -> StorageResult<Option<Device>>;

    /// All devices ordered by name
    async fn list_all(&self) -> StorageResult<Vec<Device>>;

    async fn update_address(&self, id: i64, address: &str) -> StorageResult<Device>;

    async fn set_active(&self, id: i64, active: bool) -> StorageResult<Device>;

    /// Delete a device; users, configuration and logs cascade
    async fn delete(&self, id: i64) -> StorageResult<()>;
}

const DEVICE_COLUMNS: &str = "id, name, address, description, is_active, created_at, updated_at";

/// SQLite implementation of DeviceRepository
#[derive(Debug, Clone)]
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_where(&self, clause: &str, value: impl ToString) -> StorageResult<Option<Device>> {
        let sql = format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE {clause}");
        let device = sqlx::query_as::<_, Device>(&sql)
            .bind(value.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(device)
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<Device>> {
        let device = sqlx::query_as::<_, Device>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    async fn find_by_name(&self, name: &str) -> StorageResult<Option<Device>> {
        self.find_where("name = ?", name).await
    }

    async fn find_by_address(&self, address: &str) -> StorageResult<Option<Device>> {
        self.find_where("address = ?", address).await
    }

    async fn find_active_by_address(&self, address: &str) -> StorageResult<Option<Device>> {
        self.find_where("address = ? AND is_active = 1", address).await
    }

    async fn find_active_by_id(&self, id: i64) -> StorageResult<Option<Device>> {
        let device = sqlx::query_as::<_, Device>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = ? AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    async fn list_all(&self) -> StorageResult<Vec<Device>> {
        let devices = sqlx::query_as::<_, Device>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(devices)
    }

    async fn update_address(&self, id: i64, address: &str) -> StorageResult<Device> {
        sqlx::query_as::<_, Device>(&format!(
            "UPDATE devices SET address = ?, updated_at = ? WHERE id = ? RETURNING {DEVICE_COLUMNS}"
        ))
        .bind(address)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("Device", "id", id))
    }

    async fn set_active(&self, id: i64, active: bool) -> StorageResult<Device> {
        sqlx::query_as::<_, Device>(&format!(
            "UPDATE devices SET is_active = ?, updated_at = ? WHERE id = ? RETURNING {DEVICE_COLUMNS}"
        ))
        .bind(active)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("Device", "id", id))
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Device", "id", id));
        }

        Ok(())
    }
}
